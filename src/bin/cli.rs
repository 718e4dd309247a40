//! CLI for writing points and inspecting a data node

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use minits::common::DatabaseConfig;
use minits::coordinator::FieldValue;
use minits::{ConsistencyLevel, WriteRequest};

#[derive(Parser)]
#[command(name = "minits")]
#[command(about = "minits time-series write CLI")]
#[command(version)]
struct Cli {
    /// Data node URL
    #[arg(long, default_value = "http://localhost:8086")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a single point
    Write {
        /// Measurement name
        measurement: String,

        /// Field value: true/false, an integer suffixed with `i`, a float, or text
        value: String,

        /// Database
        #[arg(long)]
        db: String,

        /// Retention policy (database default if omitted)
        #[arg(long, default_value = "")]
        rp: String,

        /// Consistency level: any, one, quorum, all
        #[arg(long, default_value = "one")]
        consistency: ConsistencyLevel,

        /// Tags as key=value (repeatable)
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        /// RFC 3339 timestamp (now if omitted)
        #[arg(long)]
        time: Option<DateTime<Utc>>,
    },

    /// Create a database with a default retention policy
    CreateDb {
        name: String,

        #[arg(long, default_value = "autogen")]
        rp: String,

        #[arg(long, default_value = "1")]
        replica_n: usize,

        #[arg(long, default_value = "0s")]
        duration: String,

        #[arg(long, default_value = "7d")]
        shard_group_duration: String,
    },

    /// Show node status
    Status,
}

fn parse_tag(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn parse_value(s: &str) -> FieldValue {
    match s {
        "true" => return FieldValue::Boolean(true),
        "false" => return FieldValue::Boolean(false),
        _ => {}
    }
    if let Some(Ok(i)) = s.strip_suffix('i').map(str::parse::<i64>) {
        return FieldValue::Integer(i);
    }
    match s.parse::<f64>() {
        Ok(f) => FieldValue::Float(f),
        Err(_) => FieldValue::String(s.to_string()),
    }
}

async fn error_message(resp: reqwest::Response) -> String {
    let status = resp.status();
    match resp.json::<serde_json::Value>().await {
        Ok(body) => body["error"]
            .as_str()
            .map(|s| format!("{}: {}", status, s))
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = cli.node.trim_end_matches('/');

    match cli.command {
        Commands::Write {
            measurement,
            value,
            db,
            rp,
            consistency,
            tags,
            time,
        } => {
            let tags: Vec<(&str, &str)> =
                tags.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let mut req = WriteRequest::new(db.as_str(), rp.as_str(), consistency);
            req.add_point(
                &measurement,
                parse_value(&value),
                time.unwrap_or_else(Utc::now),
                &tags,
            );

            let level = consistency.to_string();
            let resp = client
                .post(format!("{}/write", node))
                .query(&[
                    ("db", db.as_str()),
                    ("rp", rp.as_str()),
                    ("consistency", level.as_str()),
                ])
                .json(&req.points)
                .send()
                .await
                .context("sending write")?;

            if resp.status().is_success() {
                println!("✓ Wrote 1 point to {} (consistency {})", db, consistency);
            } else {
                anyhow::bail!("write failed: {}", error_message(resp).await);
            }
        }
        Commands::CreateDb {
            name,
            rp,
            replica_n,
            duration,
            shard_group_duration,
        } => {
            let config = DatabaseConfig {
                name,
                retention_policy: rp,
                replica_n,
                duration,
                shard_group_duration,
            };
            let resp = client
                .post(format!("{}/admin/databases", node))
                .json(&config)
                .send()
                .await
                .context("creating database")?;

            if resp.status().is_success() {
                println!(
                    "✓ Database {} ready (default policy {})",
                    config.name, config.retention_policy
                );
            } else {
                anyhow::bail!("create failed: {}", error_message(resp).await);
            }
        }
        Commands::Status => {
            let resp = client
                .get(format!("{}/admin/status", node))
                .send()
                .await
                .context("fetching status")?;
            if !resp.status().is_success() {
                anyhow::bail!("status failed: {}", error_message(resp).await);
            }

            let status: serde_json::Value = resp.json().await?;
            println!("Node status:");
            println!("  Node ID: {}", status["node_id"]);
            println!("  Version: {}", status["version"]);
            println!("  Uptime: {}s", status["uptime_seconds"]);
            println!("  Databases: {}", status["databases"]);
            println!(
                "  Cluster nodes: {}",
                status["nodes"].as_array().map(Vec::len).unwrap_or(0)
            );
            println!("  Local shards: {}", status["local_shards"]);
            println!("  Series: {}", status["series"]);
            println!("  Cache size: {} bytes", status["cache_size"]);
        }
    }

    Ok(())
}
