use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;
use ethminer_core::logfile::{AnchorMode, EvaluatorConfig};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Where the exporter gets its answer from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Scan the miner's log file
    #[default]
    Log,
    /// Query the miner's JSON-RPC API
    Rpc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Value of the `miner` label on every metric
    #[serde(default = "default_miner_id")]
    pub miner_id: String,

    #[serde(default)]
    pub source: SourceKind,

    /// ethminer log, read backwards on every scrape
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// IANA name of the zone the miner writes its log in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Lines examined before giving up on finding a status line
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Age in seconds after which a status line no longer counts
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    #[serde(default)]
    pub anchor: AnchorMode,

    /// host:port of the miner API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    /// Serve this canned API reply instead of contacting the miner
    #[serde(default)]
    pub test_response_file: Option<PathBuf>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Also write the exporter's own logs to daily files here
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,
}

fn default_listen_address() -> String {
    "0.0.0.0:9201".to_string()
}

fn default_miner_id() -> String {
    "default".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/var/log/ethminer.log")
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_max_lines() -> usize {
    EvaluatorConfig::DEFAULT_MAX_LINES
}

fn default_max_age_secs() -> u64 {
    EvaluatorConfig::DEFAULT_MAX_AGE_SECS
}

fn default_api_url() -> String {
    "127.0.0.1:3333".to_string()
}

fn default_api_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_retention_days() -> u64 {
    3
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            miner_id: default_miner_id(),
            source: SourceKind::default(),
            log_file: default_log_file(),
            timezone: default_timezone(),
            max_lines: default_max_lines(),
            max_age_secs: default_max_age_secs(),
            anchor: AnchorMode::default(),
            api_url: default_api_url(),
            api_timeout_secs: default_api_timeout_secs(),
            test_response_file: None,
            log_level: default_log_level(),
            log_dir: None,
            log_retention_days: default_log_retention_days(),
        }
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: ExporterConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// Read `path` if it exists, otherwise start from the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Override fields from environment variables, looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LISTEN_ADDRESS") {
            self.listen_address = v;
        }
        if let Some(v) = lookup("MINER_ID") {
            self.miner_id = v;
        }
        if let Some(v) = lookup("SOURCE") {
            self.source = match v.to_ascii_lowercase().as_str() {
                "log" => SourceKind::Log,
                "rpc" | "api" => SourceKind::Rpc,
                other => anyhow::bail!("SOURCE must be 'log' or 'rpc', got '{}'", other),
            };
        }
        if let Some(v) = lookup("LOG_FILE") {
            self.log_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("TIMEZONE") {
            self.timezone = v;
        }
        if let Some(v) = lookup("MAX_LINES") {
            self.max_lines = v.parse().with_context(|| format!("MAX_LINES is not a count: '{}'", v))?;
        }
        if let Some(v) = lookup("MAX_AGE") {
            self.max_age_secs = v.parse().with_context(|| format!("MAX_AGE is not seconds: '{}'", v))?;
        }
        if let Some(v) = lookup("ANCHOR") {
            self.anchor = match v.to_ascii_lowercase().as_str() {
                "modified" => AnchorMode::Modified,
                "now" => AnchorMode::Now,
                other => anyhow::bail!("ANCHOR must be 'modified' or 'now', got '{}'", other),
            };
        }
        if let Some(v) = lookup("API_URL") {
            self.api_url = v;
        }
        if let Some(v) = lookup("API_TIMEOUT") {
            self.api_timeout_secs = v.parse().with_context(|| format!("API_TIMEOUT is not seconds: '{}'", v))?;
        }
        if lookup("TEST_MODE").as_deref() == Some("1") {
            self.test_response_file = Some(PathBuf::from("test.json"));
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Validate and freeze the configuration.
    pub fn resolve(self) -> anyhow::Result<Settings> {
        let timezone = self
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))?;

        Ok(Settings {
            listen_address: normalize_listen_address(&self.listen_address),
            timezone,
            config: self,
        })
    }
}

/// A bare `:port` binds every interface.
fn normalize_listen_address(address: &str) -> String {
    match address.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => address.to_string(),
    }
}

/// Immutable configuration shared by every request
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: ExporterConfig,
    pub timezone: Tz,
    pub listen_address: String,
}

impl Settings {
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig {
            max_lines: self.config.max_lines,
            max_age: Duration::from_secs(self.config.max_age_secs),
            timezone: self.timezone,
            anchor: self.config.anchor,
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.config.api_timeout_secs)
    }
}
