//! Miner liveness probes and metric rendering for the ethminer exporter.
//!
//! Two probes answer the same question ("is the miner active, and how fast?"):
//! - [`logfile::LogFileProbe`] scans the miner's log backwards
//! - [`rpc::RpcProbe`] asks the miner's JSON-RPC endpoint

pub mod error;
pub mod logfile;
pub mod metrics;
pub mod probe;
pub mod rpc;
pub mod status;

pub use error::ProbeError;
pub use metrics::MetricsFormatter;
pub use probe::MinerProbe;
pub use status::MinerStatus;
