//! Write consistency levels
//!
//! Decides whether the acknowledgements collected for one shard satisfy the
//! level requested by the caller. Pure: counts in, boolean out.

use crate::common::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum replica acknowledgements required for a shard write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    /// At least one owner acknowledged
    Any,
    /// At least one owner acknowledged
    #[default]
    One,
    /// A strict majority of owners acknowledged
    Quorum,
    /// Every owner acknowledged
    All,
}

impl ConsistencyLevel {
    /// Acknowledgements needed out of `owners`
    pub fn required_acks(&self, owners: usize) -> usize {
        match self {
            ConsistencyLevel::Any | ConsistencyLevel::One => 1,
            ConsistencyLevel::Quorum => owners / 2 + 1,
            ConsistencyLevel::All => owners,
        }
    }

    /// Is a shard with `owners` replicas, `successes` of which acknowledged,
    /// written at this level?
    pub fn is_satisfied(&self, owners: usize, successes: usize) -> bool {
        match self {
            ConsistencyLevel::Any | ConsistencyLevel::One => successes >= 1,
            ConsistencyLevel::Quorum => successes > owners / 2,
            ConsistencyLevel::All => successes == owners,
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyLevel::Any => write!(f, "any"),
            ConsistencyLevel::One => write!(f, "one"),
            ConsistencyLevel::Quorum => write!(f, "quorum"),
            ConsistencyLevel::All => write!(f, "all"),
        }
    }
}

impl FromStr for ConsistencyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(ConsistencyLevel::Any),
            "one" => Ok(ConsistencyLevel::One),
            "quorum" => Ok(ConsistencyLevel::Quorum),
            "all" => Ok(ConsistencyLevel::All),
            other => Err(Error::InvalidRequest(format!(
                "invalid consistency level: {}",
                other
            ))),
        }
    }
}
