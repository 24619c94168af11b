use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::evaluator::ActivityEvaluator;
use crate::error::ProbeError;
use crate::probe::MinerProbe;
use crate::status::MinerStatus;

/// Probe backed by the miner's log file.
///
/// Each call opens the file afresh on the blocking pool; nothing is cached.
#[derive(Clone)]
pub struct LogFileProbe {
    path: PathBuf,
    evaluator: Arc<ActivityEvaluator>,
}

impl LogFileProbe {
    pub fn new(path: impl Into<PathBuf>, evaluator: ActivityEvaluator) -> Self {
        Self {
            path: path.into(),
            evaluator: Arc::new(evaluator),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MinerProbe for LogFileProbe {
    async fn probe(&self) -> Result<MinerStatus, ProbeError> {
        let path = self.path.clone();
        let evaluator = self.evaluator.clone();

        tokio::task::spawn_blocking(move || evaluator.evaluate_path(&path, Utc::now())).await?
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
