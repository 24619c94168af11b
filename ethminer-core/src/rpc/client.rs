//! ethminer API client
//!
//! The API speaks newline-delimited JSON over plain TCP. The request is
//! followed by a blank line, which ethminer accepts as a terminator.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::types::{StatReply, StatRequest};
use crate::error::ProbeError;
use crate::probe::MinerProbe;
use crate::status::MinerStatus;

const REQUEST_TERMINATOR: &str = "\r\n\r\n";

/// Probe backed by the miner's JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcProbe {
    address: String,
    timeout: Duration,
    /// Canned reply used instead of the socket (test mode)
    fixture: Option<PathBuf>,
}

impl RpcProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
            fixture: None,
        }
    }

    /// Read replies from `path` instead of contacting the miner.
    pub fn with_fixture(mut self, path: impl Into<PathBuf>) -> Self {
        self.fixture = Some(path.into());
        self
    }

    /// One request/reply exchange with the miner.
    async fn exchange(&self) -> std::io::Result<String> {
        let mut stream = TcpStream::connect(&self.address).await?;

        let request = serde_json::to_string(&StatRequest::default())?;
        stream.write_all(request.as_bytes()).await?;
        stream.write_all(REQUEST_TERMINATOR.as_bytes()).await?;
        stream.flush().await?;

        let mut reply = String::new();
        BufReader::new(stream).read_line(&mut reply).await?;
        Ok(reply)
    }

    /// Raw reply text, or `None` when the miner did not answer.
    async fn fetch(&self) -> Result<Option<String>, ProbeError> {
        if let Some(path) = &self.fixture {
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ProbeError::Fixture {
                    path: path.clone(),
                    source,
                })?;
            return Ok(Some(raw));
        }

        match timeout(self.timeout, self.exchange()).await {
            Ok(Ok(reply)) if reply.trim().is_empty() => {
                warn!("Miner API at {} closed the connection without a reply", self.address);
                Ok(None)
            }
            Ok(Ok(reply)) => Ok(Some(reply)),
            Ok(Err(e)) => {
                warn!("Miner API at {} unreachable: {}", self.address, e);
                Ok(None)
            }
            Err(_) => {
                warn!("Miner API at {} timed out after {:?}", self.address, self.timeout);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl MinerProbe for RpcProbe {
    async fn probe(&self) -> Result<MinerStatus, ProbeError> {
        let Some(raw) = self.fetch().await? else {
            return Ok(MinerStatus::down(None));
        };
        debug!("Miner API reply: {}", raw.trim());

        let hash_rate = StatReply::parse(&raw)?.hash_rate_mhs()?;
        Ok(MinerStatus::active(hash_rate, Utc::now()))
    }

    fn name(&self) -> &'static str {
        "rpc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    const REPLY: &str = r#"{"id":5,"jsonrpc":"2.0","result":["0.16.1","120","178260;412;0","29710;29680"]}"#;

    /// Accept one connection, check the request and answer with `reply`.
    async fn fake_miner(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut request = String::new();
            reader.read_line(&mut request).await.unwrap();
            assert!(request.contains("miner_getstat1"));

            let mut stream = reader.into_inner();
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.write_all(b"\n").await.unwrap();
        });

        address
    }

    #[tokio::test]
    async fn test_probe_reads_hash_rate() {
        let address = fake_miner(REPLY).await;
        let status = RpcProbe::new(address, Duration::from_secs(5)).probe().await.unwrap();
        assert!(status.up);
        assert_eq!(status.hash_rate_mhs, 178.26);
        assert!(status.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_probe_malformed_reply() {
        let address = fake_miner("{\"error\":").await;
        let result = RpcProbe::new(address, Duration::from_secs(5)).probe().await;
        assert!(matches!(result, Err(ProbeError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_unreachable_miner_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let status = RpcProbe::new(address, Duration::from_secs(5)).probe().await.unwrap();
        assert_eq!(status, MinerStatus::down(None));
    }

    #[tokio::test]
    async fn test_silent_miner_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let _hold = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let status = RpcProbe::new(address, Duration::from_millis(200)).probe().await.unwrap();
        assert!(!status.up);
    }

    #[tokio::test]
    async fn test_fixture_mode() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.json");
        std::fs::write(&path, REPLY).unwrap();

        let probe = RpcProbe::new("127.0.0.1:1", Duration::from_secs(1)).with_fixture(&path);
        let status = probe.probe().await.unwrap();
        assert!(status.up);
        assert_eq!(status.hash_rate_mhs, 178.26);

        let missing = RpcProbe::new("127.0.0.1:1", Duration::from_secs(1))
            .with_fixture(dir.path().join("missing.json"));
        assert!(matches!(missing.probe().await, Err(ProbeError::Fixture { .. })));
    }
}
