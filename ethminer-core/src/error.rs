use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that prevent a probe from producing any answer.
///
/// These are reported to the scraper as server errors. A miner that is simply
/// inactive is not an error, see [`crate::MinerStatus::down`].
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("cannot open miner log {path:?}: {source}")]
    LogUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading miner log {path:?}: {source}")]
    LogRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read rpc fixture {path:?}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed miner rpc reply: {0}")]
    Protocol(String),

    #[error("probe task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}
