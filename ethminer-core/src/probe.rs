use async_trait::async_trait;

use crate::error::ProbeError;
use crate::status::MinerStatus;

/// A data source that can tell whether the miner is working.
///
/// Every call is independent: implementations open their own handles and
/// keep no state between requests.
#[async_trait]
pub trait MinerProbe {
    async fn probe(&self) -> Result<MinerStatus, ProbeError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
