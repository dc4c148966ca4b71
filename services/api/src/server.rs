use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use organ_trust::config::AppConfig;
use organ_trust::error::AppError;
use organ_trust::telemetry;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{load_seed, AppState, Services};
use crate::routes::with_workflow_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.directory_csv.take() {
        config.directory.seed_csv = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let seed = load_seed(config.directory.seed_csv.as_deref())?;
    let services = Services::from_seed(&seed);

    let app = with_workflow_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "organ trust service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
