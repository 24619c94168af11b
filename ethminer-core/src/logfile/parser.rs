//! Miner log line classifier
//!
//! ethminer status lines look like
//!   ` m 23:23:04|ethminer  Speed 178.26 MH/s    gpu/0 29.71  gpu/1 29.68`
//! and new jobs are announced with
//!   `23:23:04|cudaminer6set work; seed: #4d0a1a76, target: #0000000225c1`

use anyhow::{Context, Result};
use chrono::NaiveTime;
use regex::Regex;

use super::types::ParsedStatus;

/// Substring ethminer writes when a device is handed a new job
pub const WORK_CHANGE_MARKER: &str = "set work";

/// Compiled patterns for recognising status and work-change lines.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    hash_rate: Regex,
    time_of_day: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        let hash_rate = Regex::new(r"(\d+(?:\.\d+)?)\s*MH/s")
            .context("Failed to compile hash rate regex")?;
        // Two digits per field, not part of a longer digit run
        let time_of_day = Regex::new(r"(?:^|\D)(\d{2}):(\d{2}):(\d{2})(?:\D|$)")
            .context("Failed to compile time of day regex")?;

        Ok(Self {
            hash_rate,
            time_of_day,
        })
    }

    /// Hash rate in MH/s, if the line reports one.
    pub fn hash_rate(&self, line: &str) -> Option<f64> {
        let caps = self.hash_rate.captures(line)?;
        caps.get(1)?.as_str().parse::<f64>().ok()
    }

    /// `(hour, minute, second)` of the first valid `HH:MM:SS` in the line.
    ///
    /// Out-of-range matches such as `99:99:99` are passed over.
    pub fn time_of_day(&self, line: &str) -> Option<(u32, u32, u32)> {
        let mut start = 0;
        while let Some(caps) = self.time_of_day.captures_at(line, start) {
            let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
            let (hour, minute, second) = (field(1)?, field(2)?, field(3)?);
            if NaiveTime::from_hms_opt(hour, minute, second).is_some() {
                return Some((hour, minute, second));
            }
            // The delimiter after this match may open the next one
            start = caps.get(3)?.end();
        }
        None
    }

    /// Both hash rate and time of day, or `None` for any other kind of line.
    pub fn status(&self, line: &str) -> Option<ParsedStatus> {
        let hash_rate_mhs = self.hash_rate(line)?;
        let (hour, minute, second) = self.time_of_day(line)?;

        Some(ParsedStatus {
            hash_rate_mhs,
            hour,
            minute,
            second,
        })
    }

    pub fn is_work_change(&self, line: &str) -> bool {
        line.contains(WORK_CHANGE_MARKER)
    }
}
