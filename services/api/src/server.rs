use crate::cli::ServeArgs;
use crate::infra::{default_intake_policies, AppState, InMemoryApplicationRepository};
use crate::routes::with_filing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use ip_filing::config::AppConfig;
use ip_filing::error::AppError;
use ip_filing::telemetry;
use ip_filing::workflows::intake::{FilingService, LocalFileStore};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(storage_root) = args.storage_root.take() {
        config.storage.upload_root = storage_root.into();
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let files = Arc::new(LocalFileStore::new(config.storage.upload_root.clone()));
    let filing_service = Arc::new(FilingService::new(
        repository,
        files,
        default_intake_policies(),
    ));

    let app = with_filing_routes(filing_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ip filing intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
