//! Text exposition of a [`MinerStatus`]

use std::fmt::Write;

use crate::status::MinerStatus;

/// Decimal places used for the hash rate gauge.
pub const HASH_RATE_PRECISION: usize = 6;

/// Renders probe results as `name{miner="id"} value` lines.
#[derive(Debug, Clone)]
pub struct MetricsFormatter {
    miner_id: String,
}

impl MetricsFormatter {
    pub fn new(miner_id: impl Into<String>) -> Self {
        Self {
            miner_id: miner_id.into(),
        }
    }

    pub fn render(&self, status: &MinerStatus) -> String {
        let mut out = String::new();
        self.push(&mut out, "ethminer_up", &u8::from(status.up).to_string());
        if let Some(last_activity) = status.last_activity {
            self.push(&mut out, "ethminer_lastactivity", &last_activity.to_string());
        }
        self.push(
            &mut out,
            "ethminer_hashrate",
            &format!("{:.*}", HASH_RATE_PRECISION, status.hash_rate_mhs),
        );
        out
    }

    fn push(&self, out: &mut String, name: &str, value: &str) {
        // Writing into a String cannot fail
        let _ = writeln!(out, "{}{{miner=\"{}\"}} {}", name, self.label_value(), value);
    }

    /// Escape the label value the way the exposition format expects.
    fn label_value(&self) -> String {
        self.miner_id
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}
