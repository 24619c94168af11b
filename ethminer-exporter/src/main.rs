use std::path::PathBuf;

use anyhow::{Context, Result};
use ethminer_core::MetricsFormatter;

use ethminer_exporter::config::{self, ExporterConfig};
use ethminer_exporter::logging;
use ethminer_exporter::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::var("CONFIG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    let mut config = ExporterConfig::load(&config_path)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    let settings = config.resolve()?;

    // Initialize logging
    let _logging_guard = logging::init_logging(
        &settings.config.log_level,
        settings.config.log_dir.as_deref(),
        settings.config.log_retention_days,
    )?;

    tracing::info!("Ethminer exporter starting...");
    tracing::info!("Miner ID: {}", settings.config.miner_id);

    let probe = server::build_probe(&settings)?;
    let state = AppState::new(probe, MetricsFormatter::new(settings.config.miner_id.clone()));
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&settings.listen_address)
        .await
        .with_context(|| format!("Failed to bind {}", settings.listen_address))?;
    tracing::info!("Ethminer exporter listening on {}", settings.listen_address);

    axum::serve(listener, app).await?;

    Ok(())
}
