//! ethminer API message types

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// `miner_getstat1` request
#[derive(Debug, Clone, Serialize)]
pub struct StatRequest {
    pub method: &'static str,
    pub jsonrpc: &'static str,
    pub id: i64,
}

impl Default for StatRequest {
    fn default() -> Self {
        Self {
            method: "miner_getstat1",
            jsonrpc: "2.0",
            id: 5,
        }
    }
}

/// `miner_getstat1` reply
///
/// `result` is a list of strings:
///   0: version, 1: uptime in minutes, 2: "kh/s;accepted;rejected", ...
#[derive(Debug, Clone, Deserialize)]
pub struct StatReply {
    pub id: Option<i64>,
    pub jsonrpc: Option<String>,
    pub result: Vec<String>,
}

impl StatReply {
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        serde_json::from_str(raw.trim()).map_err(|e| ProbeError::Protocol(e.to_string()))
    }

    /// Total hash rate converted from kH/s to MH/s.
    pub fn hash_rate_mhs(&self) -> Result<f64, ProbeError> {
        let totals = self
            .result
            .get(2)
            .ok_or_else(|| ProbeError::Protocol("result has no totals field".to_string()))?;
        let khs = totals.split(';').next().unwrap_or_default().trim();
        if khs.is_empty() {
            return Ok(0.0);
        }

        khs.parse::<f64>()
            .map(|khs| khs / 1000.0)
            .map_err(|e| ProbeError::Protocol(format!("bad hash rate {khs:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let json = serde_json::to_string(&StatRequest::default()).unwrap();
        assert_eq!(json, r#"{"method":"miner_getstat1","jsonrpc":"2.0","id":5}"#);
    }

    #[test]
    fn test_parse_reply() {
        let raw = r#"{"id":5,"jsonrpc":"2.0","result":["0.16.1","120","178260;412;0","29710;29680","0;0;0","off;off","53;70","eu1.ethermine.org:4444","0;0;0;0"]}"#;
        let reply = StatReply::parse(raw).unwrap();
        assert_eq!(reply.hash_rate_mhs().unwrap(), 178.26);
    }

    #[test]
    fn test_empty_rate_is_zero() {
        let reply = StatReply::parse(r#"{"result":["0.16.1","0",";0;0"]}"#).unwrap();
        assert_eq!(reply.hash_rate_mhs().unwrap(), 0.0);
    }

    #[test]
    fn test_malformed_reply() {
        assert!(matches!(StatReply::parse("not json"), Err(ProbeError::Protocol(_))));

        let short = StatReply::parse(r#"{"result":["0.16.1"]}"#).unwrap();
        assert!(matches!(short.hash_rate_mhs(), Err(ProbeError::Protocol(_))));

        let garbage = StatReply::parse(r#"{"result":["0.16.1","1","fast;1;0"]}"#).unwrap();
        assert!(matches!(garbage.hash_rate_mhs(), Err(ProbeError::Protocol(_))));
    }
}
