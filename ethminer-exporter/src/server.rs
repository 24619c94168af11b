use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use ethminer_core::logfile::{ActivityEvaluator, LogFileProbe};
use ethminer_core::rpc::RpcProbe;
use ethminer_core::{MetricsFormatter, MinerProbe};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::{Settings, SourceKind};

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const INDEX_HTML: &str = r#"<!doctype html>
<html>
    <head>
        <meta charset="utf-8">
        <title>Ethminer Exporter</title>
    </head>
    <body>
        <h1>Ethminer Exporter</h1>
        <p><a href="/metrics">Metrics</a></p>
    </body>
</html>
"#;

pub type SharedProbe = Arc<dyn MinerProbe + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    probe: SharedProbe,
    formatter: MetricsFormatter,
}

impl AppState {
    pub fn new(probe: SharedProbe, formatter: MetricsFormatter) -> Self {
        Self { probe, formatter }
    }
}

/// Build the probe selected by the configuration.
pub fn build_probe(settings: &Settings) -> anyhow::Result<SharedProbe> {
    let config = &settings.config;
    let probe: SharedProbe = match config.source {
        SourceKind::Log => {
            let evaluator = ActivityEvaluator::new(settings.evaluator_config())?;
            info!(
                "Reading miner log {:?} (timezone {}, max age {}s, max {} lines)",
                config.log_file, settings.timezone, config.max_age_secs, config.max_lines
            );
            Arc::new(LogFileProbe::new(&config.log_file, evaluator))
        }
        SourceKind::Rpc => {
            let mut probe = RpcProbe::new(&config.api_url, settings.api_timeout());
            if let Some(fixture) = &config.test_response_file {
                info!("Test mode enabled, serving miner API reply from {:?}", fixture);
                probe = probe.with_fixture(fixture);
            } else {
                info!("Querying miner API at {}", config.api_url);
            }
            Arc::new(probe)
        }
    };
    Ok(probe)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.probe.probe().await {
        Ok(status) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
            state.formatter.render(&status),
        )
            .into_response(),
        Err(e) => {
            error!("{} probe failed: {}", state.probe.name(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExporterConfig;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use ethminer_core::{MinerStatus, ProbeError};
    use std::path::PathBuf;
    use tower::ServiceExt;

    struct FixedProbe(Option<MinerStatus>);

    #[async_trait]
    impl MinerProbe for FixedProbe {
        async fn probe(&self) -> Result<MinerStatus, ProbeError> {
            self.0.ok_or_else(|| ProbeError::Protocol("miner said nonsense".to_string()))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn app(status: Option<MinerStatus>) -> Router {
        router(AppState::new(
            Arc::new(FixedProbe(status)),
            MetricsFormatter::new("rig1"),
        ))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics() {
        let status = MinerStatus {
            up: true,
            hash_rate_mhs: 178.26,
            last_activity: Some(1_771_456_984),
        };
        let (code, body) = get(app(Some(status)), "/metrics").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(
            body,
            "ethminer_up{miner=\"rig1\"} 1\n\
             ethminer_lastactivity{miner=\"rig1\"} 1771456984\n\
             ethminer_hashrate{miner=\"rig1\"} 178.260000\n"
        );
    }

    #[tokio::test]
    async fn test_probe_failure_is_server_error() {
        let (code, body) = get(app(None), "/metrics").await;
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("miner said nonsense"));
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let (code, body) = get(app(None), "/").await;
        assert_eq!(code, StatusCode::OK);
        assert!(body.contains("<a href=\"/metrics\">Metrics</a>"));

        let (code, body) = get(app(None), "/health").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_unreadable_log_is_server_error() {
        let settings = ExporterConfig {
            log_file: PathBuf::from("/nonexistent/ethminer.log"),
            ..ExporterConfig::default()
        }
        .resolve()
        .unwrap();

        let probe = build_probe(&settings).unwrap();
        let app = router(AppState::new(probe, MetricsFormatter::new("default")));
        let (code, body) = get(app, "/metrics").await;
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("cannot open miner log"));
    }

    #[tokio::test]
    async fn test_missing_fixture_is_server_error() {
        let settings = ExporterConfig {
            source: SourceKind::Rpc,
            test_response_file: Some(PathBuf::from("/nonexistent/test.json")),
            ..ExporterConfig::default()
        }
        .resolve()
        .unwrap();

        let probe = build_probe(&settings).unwrap();
        let app = router(AppState::new(probe, MetricsFormatter::new("default")));
        let (code, body) = get(app, "/metrics").await;
        assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("ethminer_up"));
    }
}
