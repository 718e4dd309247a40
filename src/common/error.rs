//! Error types for minits

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Mapping Errors ===
    #[error("Retention policy not found: {database}.{policy}")]
    RetentionPolicyNotFound { database: String, policy: String },

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Shard group unavailable: {0}")]
    ShardGroupUnavailable(String),

    // === Write Errors ===
    #[error("Write to shard {shard_id} on node {node_id} failed: {reason}")]
    ReplicaWrite {
        shard_id: u64,
        node_id: u64,
        reason: String,
    },

    #[error("Write to shard {shard_id} on node {node_id} did not complete before the deadline")]
    ReplicaTimeout { shard_id: u64, node_id: u64 },

    #[error("Write failed on shard {shard_id}: {source}")]
    WriteFailed {
        shard_id: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("Cache full: size {size} exceeds limit {limit}")]
    CacheFull { size: u64, limit: u64 },

    #[error("Shard not found: {0}")]
    ShardNotFound(u64),

    // === Network Errors ===
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    // === Metadata Errors ===
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Metadata corrupted: {0}")]
    MetadataCorrupted(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_)
            | Error::ReplicaTimeout { .. }
            | Error::ConnectionFailed(_)
            | Error::ShardGroupUnavailable(_)
            | Error::CacheFull { .. } => true,
            Error::WriteFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// True for the aggregate error returned when a shard misses its
    /// consistency level.
    pub fn is_write_failed(&self) -> bool {
        matches!(self, Error::WriteFailed { .. })
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::RetentionPolicyNotFound { .. }
            | Error::DatabaseNotFound(_)
            | Error::ShardNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidConfig(_) | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) | Error::ReplicaTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Error::ShardGroupUnavailable(_) | Error::CacheFull { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_connect() {
            Error::ConnectionFailed(e.to_string())
        } else {
            Error::Http(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_write_failed_wraps_source() {
        let err = Error::WriteFailed {
            shard_id: 7,
            source: Box::new(Error::ReplicaWrite {
                shard_id: 7,
                node_id: 2,
                reason: "disk full".into(),
            }),
        };
        assert!(err.is_write_failed());
        assert!(err.to_string().contains("shard 7"));
        assert!(err.to_string().contains("disk full"));

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("node 2"));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Timeout("slow".into()).is_retryable());
        assert!(Error::ShardGroupUnavailable("meta down".into()).is_retryable());
        assert!(!Error::RetentionPolicyNotFound {
            database: "db".into(),
            policy: "rp".into()
        }
        .is_retryable());

        let wrapped = Error::WriteFailed {
            shard_id: 1,
            source: Box::new(Error::ReplicaTimeout {
                shard_id: 1,
                node_id: 3,
            }),
        };
        assert!(wrapped.is_retryable());
        assert!(wrapped.to_string().contains("node 3"));
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            Error::RetentionPolicyNotFound {
                database: "db".into(),
                policy: "rp".into()
            }
            .to_http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::InvalidRequest("bad".into()).to_http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::ShardGroupUnavailable("x".into()).to_http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
