//! Miner log data types

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hash rate and time of day read from one status line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedStatus {
    /// Reported speed, e.g. 178.26
    pub hash_rate_mhs: f64,
    /// 0..=23
    pub hour: u32,
    /// 0..=59
    pub minute: u32,
    /// 0..=59
    pub second: u32,
}

impl ParsedStatus {
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second)
    }
}

/// Where the calendar date for a log line's time of day comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// Date of the log file's last modification
    #[default]
    Modified,
    /// Date of the current request
    Now,
}

/// Tuning for [`super::ActivityEvaluator`]
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Maximum number of candidate lines examined per scan
    pub max_lines: usize,
    /// Status lines older than this mean the miner is inactive
    pub max_age: Duration,
    /// Timezone the miner writes its log in
    pub timezone: Tz,
    pub anchor: AnchorMode,
}

impl EvaluatorConfig {
    pub const DEFAULT_MAX_LINES: usize = 100;
    pub const DEFAULT_MAX_AGE_SECS: u64 = 60;
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_lines: Self::DEFAULT_MAX_LINES,
            max_age: Duration::from_secs(Self::DEFAULT_MAX_AGE_SECS),
            timezone: Tz::UTC,
            anchor: AnchorMode::Modified,
        }
    }
}
