//! Data node binary

use clap::{Parser, Subcommand};
use minits::common::{Config, PeerConfig};
use minits::DataNode;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minits-node")]
#[command(about = "minits data node: coordinated time-series writes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start data node server
    Serve {
        /// Config file
        #[arg(long, default_value = "minits.toml")]
        config: PathBuf,

        /// Node ID
        #[arg(long)]
        id: Option<u64>,

        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<String>,

        /// Metadata directory
        #[arg(long)]
        meta_dir: Option<PathBuf>,

        /// Data nodes as id=address (repeatable)
        #[arg(long = "peer", value_parser = parse_peer)]
        peers: Vec<PeerConfig>,

        /// Write timeout in milliseconds
        #[arg(long)]
        write_timeout_ms: Option<u64>,
    },
}

fn parse_peer(s: &str) -> Result<PeerConfig, String> {
    let (id, address) = s
        .split_once('=')
        .ok_or_else(|| format!("expected id=address, got '{}'", s))?;
    let id = id
        .trim()
        .parse()
        .map_err(|e| format!("invalid peer id '{}': {}", id, e))?;
    Ok(PeerConfig {
        id,
        address: address.trim().to_string(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            id,
            bind,
            meta_dir,
            peers,
            write_timeout_ms,
        } => {
            // Load config from file and environment, then override with CLI arguments
            let mut config = Config::load_from(&config)?;
            if let Some(id) = id {
                config.node_id = id;
            }
            if let Some(bind) = bind {
                config.bind_addr = bind.parse()?;
            }
            if let Some(meta_dir) = meta_dir {
                config.meta_dir = meta_dir;
            }
            if !peers.is_empty() {
                config.peers = peers;
            }
            if let Some(ms) = write_timeout_ms {
                config.write_timeout_ms = ms;
            }
            config.validate()?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| config.log_level.clone().into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            DataNode::new(config).serve().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_peer() {
        let peer = parse_peer("2=http://10.0.0.2:8086").unwrap();
        assert_eq!(peer.id, 2);
        assert_eq!(peer.address, "http://10.0.0.2:8086");

        assert!(parse_peer("http://10.0.0.2:8086").is_err());
        assert!(parse_peer("x=http://a").is_err());
    }
}
