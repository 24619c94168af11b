//! Decide miner activity from the tail of its log
//!
//! Lines are examined newest first. The candidate is always the newer line of
//! a (newer, older) pair: the older neighbour is needed to tell whether the
//! candidate was printed right after a job switch, in which case ethminer
//! reports an artificially low speed and the sample is skipped.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tracing::debug;

use super::parser::LineClassifier;
use super::reader::ReverseLines;
use super::types::{AnchorMode, EvaluatorConfig, ParsedStatus};
use crate::error::ProbeError;
use crate::status::MinerStatus;

/// A line time more than this far past the reference instant was written the day before
const ROLLOVER_THRESHOLD: TimeDelta = TimeDelta::hours(12);

enum Verdict {
    /// Not a usable status line, keep scanning
    Skip,
    Active(f64, DateTime<Utc>),
    Stale(DateTime<Utc>),
}

pub struct ActivityEvaluator {
    classifier: LineClassifier,
    config: EvaluatorConfig,
}

impl ActivityEvaluator {
    pub fn new(config: EvaluatorConfig) -> Result<Self> {
        Ok(Self {
            classifier: LineClassifier::new()?,
            config,
        })
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Open `path`, scan it from the end and judge the miner as of `now`.
    ///
    /// The file's modification time is the fallback activity time and, with
    /// [`AnchorMode::Modified`], the date the log's times of day belong to.
    pub fn evaluate_path(&self, path: &Path, now: DateTime<Utc>) -> Result<MinerStatus, ProbeError> {
        let unavailable = |source| ProbeError::LogUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let read_failed = |source| ProbeError::LogRead {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unavailable)?;
        let modified: DateTime<Utc> = file
            .metadata()
            .and_then(|m| m.modified())
            .map_err(unavailable)?
            .into();

        let lines = ReverseLines::new(file).map_err(read_failed)?;
        self.evaluate(lines, modified, now).map_err(read_failed)
    }

    /// Judge the miner from `lines`, ordered newest first.
    ///
    /// At most `max_lines` candidates are examined, which reads at most
    /// `max_lines + 1` lines.
    pub fn evaluate<I>(&self, lines: I, modified: DateTime<Utc>, now: DateTime<Utc>) -> io::Result<MinerStatus>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let reference = match self.config.anchor {
            AnchorMode::Modified => modified,
            AnchorMode::Now => now,
        };

        let mut lines = lines.into_iter();
        let mut newer = lines.next().transpose()?;
        let mut examined = 0;

        while let Some(candidate) = newer.take() {
            if examined == self.config.max_lines {
                debug!("No status line within the last {} lines", examined);
                return Ok(MinerStatus::down(Some(modified)));
            }
            examined += 1;

            let older = lines.next().transpose()?;
            match self.judge(&candidate, older.as_deref(), reference, now) {
                Verdict::Skip => {}
                Verdict::Active(hash_rate, at) => {
                    debug!("Miner active at {}: {} MH/s", at, hash_rate);
                    return Ok(MinerStatus::active(hash_rate, at));
                }
                Verdict::Stale(at) => {
                    debug!("Newest status line from {} is stale", at);
                    return Ok(MinerStatus::down(Some(modified)));
                }
            }
            newer = older;
        }

        debug!("Reached start of log after {} lines without a status line", examined);
        Ok(MinerStatus::down(Some(modified)))
    }

    fn judge(
        &self,
        candidate: &str,
        older: Option<&str>,
        reference: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Verdict {
        let Some(status) = self.classifier.status(candidate) else {
            return Verdict::Skip;
        };

        if older.is_some_and(|line| self.classifier.is_work_change(line)) {
            debug!("Skipping sample printed after a job switch: {}", candidate);
            return Verdict::Skip;
        }

        let Some(at) = self.resolve(&status, reference) else {
            debug!("Time of day does not exist in {}: {}", self.config.timezone, candidate);
            return Verdict::Skip;
        };

        let age = now.signed_duration_since(at).num_seconds();
        let max_age = i64::try_from(self.config.max_age.as_secs()).unwrap_or(i64::MAX);
        if age < 0 || age > max_age {
            Verdict::Stale(at)
        } else {
            Verdict::Active(status.hash_rate_mhs, at)
        }
    }

    /// Combine a time of day with the reference date in the configured zone.
    fn resolve(&self, status: &ParsedStatus, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let tz = self.config.timezone;
        let time = status.time_of_day()?;
        let date = reference.with_timezone(&tz).date_naive();

        let at = tz
            .from_local_datetime(&date.and_time(time))
            .earliest()?
            .with_timezone(&Utc);
        if at.signed_duration_since(reference) <= ROLLOVER_THRESHOLD {
            return Some(at);
        }

        let previous = date.pred_opt()?;
        tz.from_local_datetime(&previous.and_time(time))
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }
}
