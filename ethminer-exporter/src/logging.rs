use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tokio::task;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_PREFIX: &str = "ethminer-exporter";
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Keeps the file writer flushing until dropped
#[allow(dead_code)]
pub struct LoggerGuard(Option<WorkerGuard>);

/// Install the global subscriber: stdout always, daily files when `log_dir` is set.
///
/// `RUST_LOG` directives take precedence over `level`. Must be called from
/// within a tokio runtime when `log_dir` is set.
pub fn init_logging(level: &str, log_dir: Option<&Path>, retention_days: u64) -> anyhow::Result<LoggerGuard> {
    let known_level = LEVELS.contains(&level);
    let default_level = if known_level { level } else { "info" };

    let builder = EnvFilter::builder().with_default_directive(default_level.parse()?);
    let rust_log = std::env::var("RUST_LOG").unwrap_or_default();

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(builder.clone().parse_lossy(&rust_log));

    let (file_layer, guard) = match log_dir {
        Some(log_dir) => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_PREFIX)
                .filename_suffix("log")
                .build(log_dir)?;
            let (non_blocking, guard) = NonBlocking::new(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(builder.parse_lossy(&rust_log));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .init();

    if !known_level {
        tracing::warn!("Invalid log level '{}', defaulting to 'info'", level);
    }

    if let Some(log_dir) = log_dir {
        start_log_cleanup_task(log_dir.to_path_buf(), retention(retention_days));
    }

    Ok(LoggerGuard(guard))
}

/// How long rotated log files are kept, saturating on absurd values.
fn retention(days: u64) -> Duration {
    Duration::from_secs(24 * 60 * 60).saturating_mul(u32::try_from(days).unwrap_or(u32::MAX))
}

fn start_log_cleanup_task(log_dir: PathBuf, max_age: Duration) {
    task::spawn(async move {
        loop {
            if let Err(e) = cleanup_old_logs(&log_dir, LOG_PREFIX, max_age) {
                tracing::warn!("Failed to delete old log file: {}", e);
            }
            tokio::time::sleep(CLEANUP_INTERVAL).await;
        }
    });
}

/// Delete `<prefix>*.log` files in `log_dir` last modified more than `max_age` ago.
fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_age: Duration) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let mut deleted = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(file_name.starts_with(prefix) && file_name.ends_with(".log")) {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            fs::remove_file(&path)?;
            deleted += 1;
            tracing::info!("Old log file deleted: {}", file_name);
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_only_touches_old_exporter_logs() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("ethminer-exporter.2026-01-01.log");
        let fresh = dir.path().join("ethminer-exporter.2026-02-18.log");
        let foreign = dir.path().join("ethminer.log");

        for path in [&old, &fresh, &foreign] {
            fs::write(path, "x").unwrap();
        }
        let week_ago = SystemTime::now() - Duration::from_secs(7 * 24 * 60 * 60);
        for path in [&old, &foreign] {
            fs::File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(week_ago)
                .unwrap();
        }

        let deleted = cleanup_old_logs(dir.path(), LOG_PREFIX, Duration::from_secs(3 * 24 * 60 * 60)).unwrap();
        assert_eq!(deleted, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(foreign.exists());
    }

    #[test]
    fn test_retention_saturates() {
        assert_eq!(retention(3), Duration::from_secs(3 * 24 * 60 * 60));
        assert_eq!(retention(0), Duration::ZERO);
        let forever = retention(u64::MAX);
        assert_eq!(forever, retention(u64::from(u32::MAX)));

        let dir = TempDir::new().unwrap();
        let old = dir.path().join("ethminer-exporter.2026-01-01.log");
        fs::write(&old, "x").unwrap();
        assert_eq!(cleanup_old_logs(dir.path(), LOG_PREFIX, forever).unwrap(), 0);
        assert!(old.exists());
    }
}
