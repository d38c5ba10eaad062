use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{AccountContactUpdate, AccountId, NewAccount};
use super::draft::EvaluationDraft;
use super::repository::{
    EntityReader, EntityWriter, FileUploader, RepositoryError, UploadError,
};
use super::service::{EvaluationRequestService, EvaluationServiceError};

type SharedService<R, W, U> = Arc<EvaluationRequestService<R, W, U>>;

/// Router builder exposing reference data, compliance checks, and submission.
pub fn evaluation_router<R, W, U>(service: SharedService<R, W, U>) -> Router
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    Router::new()
        .route(
            "/api/v1/accounts",
            get(accounts_handler::<R, W, U>).post(create_account_handler::<R, W, U>),
        )
        .route(
            "/api/v1/accounts/:account_id/contact",
            patch(update_contact_handler::<R, W, U>),
        )
        .route("/api/v1/skus", get(skus_handler::<R, W, U>))
        .route(
            "/api/v1/evaluations/compliance",
            post(compliance_handler::<R, W, U>),
        )
        .route("/api/v1/evaluations", post(submit_handler::<R, W, U>))
        .route(
            "/api/v1/uploads/government-approval",
            post(upload_handler::<R, W, U>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadParams {
    pub(crate) filename: String,
}

pub(crate) async fn accounts_handler<R, W, U>(
    State(service): State<SharedService<R, W, U>>,
) -> Response
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    match service.accounts() {
        Ok(accounts) => {
            let payload = json!({ "available": true, "accounts": accounts });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "account list unavailable");
            let payload = json!({ "available": false, "accounts": [] });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn skus_handler<R, W, U>(State(service): State<SharedService<R, W, U>>) -> Response
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    match service.skus() {
        Ok(skus) => {
            let payload = json!({ "available": true, "skus": skus });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "sku catalog unavailable");
            let payload = json!({ "available": false, "skus": [] });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn create_account_handler<R, W, U>(
    State(service): State<SharedService<R, W, U>>,
    axum::Json(account): axum::Json<NewAccount>,
) -> Response
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    match service.create_account(account) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_contact_handler<R, W, U>(
    State(service): State<SharedService<R, W, U>>,
    Path(account_id): Path<String>,
    axum::Json(update): axum::Json<AccountContactUpdate>,
) -> Response
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    match service.update_account_contact(&AccountId(account_id), update) {
        Ok(account) => (StatusCode::OK, axum::Json(account)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn compliance_handler<R, W, U>(
    State(service): State<SharedService<R, W, U>>,
    axum::Json(draft): axum::Json<EvaluationDraft>,
) -> Response
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    let report = service.check(&draft, Utc::now());
    let payload = json!({
        "blocking": report.is_blocking(),
        "report": report,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R, W, U>(
    State(service): State<SharedService<R, W, U>>,
    axum::Json(draft): axum::Json<EvaluationDraft>,
) -> Response
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    match service.submit(&draft, Utc::now()) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn upload_handler<R, W, U>(
    State(service): State<SharedService<R, W, U>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response
where
    R: EntityReader + 'static,
    W: EntityWriter + 'static,
    U: FileUploader + 'static,
{
    match service.upload_government_approval(&params.filename, &body) {
        Ok(file) => (StatusCode::CREATED, axum::Json(file)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: EvaluationServiceError) -> Response {
    let (status, payload) = match &err {
        EvaluationServiceError::Validation(error) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        EvaluationServiceError::Draft(error) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": error.to_string() }),
        ),
        EvaluationServiceError::Compliance(block) => (
            StatusCode::CONFLICT,
            json!({
                "error": "submission blocked by compliance rules",
                "cooldown": block.cooldown,
                "quantity": block.quantity,
            }),
        ),
        EvaluationServiceError::HistoryUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": err.to_string() }),
        ),
        EvaluationServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        EvaluationServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        EvaluationServiceError::Upload(UploadError::Empty) => {
            (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
        }
        EvaluationServiceError::Upload(UploadError::TooLarge { .. }) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "error": err.to_string() }),
        ),
        EvaluationServiceError::Upload(_) => {
            (StatusCode::BAD_GATEWAY, json!({ "error": err.to_string() }))
        }
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        ),
    };

    (status, axum::Json(payload)).into_response()
}
