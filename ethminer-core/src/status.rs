use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one probe, rendered once and then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinerStatus {
    pub up: bool,
    /// Hash rate in MH/s, zero whenever `up` is false
    pub hash_rate_mhs: f64,
    /// Unix seconds of the last observed activity, if the probe can tell
    pub last_activity: Option<i64>,
}

impl MinerStatus {
    pub fn active(hash_rate_mhs: f64, at: DateTime<Utc>) -> Self {
        Self {
            up: true,
            hash_rate_mhs,
            last_activity: Some(at.timestamp()),
        }
    }

    /// Miner judged inactive; keeps the fallback activity time when one exists.
    pub fn down(last_activity: Option<DateTime<Utc>>) -> Self {
        Self {
            up: false,
            hash_rate_mhs: 0.0,
            last_activity: last_activity.map(|t| t.timestamp()),
        }
    }
}
