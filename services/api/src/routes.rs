use crate::infra::{AppState, InMemoryPlatform};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use evaluation_desk::error::AppError;
use evaluation_desk::workflows::catalog::SkuCatalogImporter;
use evaluation_desk::workflows::evaluations::{
    evaluation_router, EntityReader, EntityWriter, EvaluationRequestService, FileUploader,
};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

pub(crate) fn with_evaluation_routes<R, W, U>(
    service: Arc<EvaluationRequestService<R, W, U>>,
) -> axum::Router
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    evaluation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/catalog/import",
            axum::routing::post(catalog_import_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Replace the in-memory SKU reference data with a CSV catalog export.
pub(crate) async fn catalog_import_endpoint(
    Extension(platform): Extension<Arc<InMemoryPlatform>>,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    let skus = SkuCatalogImporter::from_reader(Cursor::new(body.into_bytes()))?;
    let imported = skus.len();
    platform.replace_skus(skus);
    info!(imported, "sku catalog replaced");

    Ok(Json(json!({ "imported": imported })))
}
