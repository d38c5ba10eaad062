use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryPlatform, InMemoryUploader};
use crate::routes::with_evaluation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use evaluation_desk::config::AppConfig;
use evaluation_desk::error::AppError;
use evaluation_desk::telemetry;
use evaluation_desk::workflows::catalog::SkuCatalogImporter;
use evaluation_desk::workflows::evaluations::EvaluationRequestService;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let platform = Arc::new(InMemoryPlatform::default());
    if let Some(path) = args.catalog.take() {
        let skus = SkuCatalogImporter::from_path(&path)?;
        info!(count = skus.len(), path = %path.display(), "sku catalog loaded");
        platform.replace_skus(skus);
    }

    let service = Arc::new(EvaluationRequestService::new(
        platform.clone(),
        platform.clone(),
        Arc::new(InMemoryUploader::default()),
        config.compliance.clone(),
    ));

    let app = with_evaluation_routes(service)
        .layer(Extension(platform))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        history_policy = config.compliance.history_failure_policy.label(),
        "evaluation desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
