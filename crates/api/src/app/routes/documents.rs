use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use serialforge_core::DocumentId;

use crate::app::routes::common::run_blocking;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:id/status-counts", get(status_counts))
        .route("/:id/sent-to-vendor", post(sent_to_vendor))
        .route("/:id/cancel", post(cancel))
}

fn parse_document_id(id: &str) -> Result<DocumentId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid document id")
    })
}

pub async fn status_counts(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let document_id = match parse_document_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let result = run_blocking(services, move |s| s.counts_by_status(document_id)).await;
    match result {
        Ok(counts) => (StatusCode::OK, Json(dto::counts_to_json(&counts))).into_response(),
        Err(e) => errors::issue_error_to_response(e),
    }
}

pub async fn sent_to_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let document_id = match parse_document_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let result =
        run_blocking(services, move |s| s.mark_sent_to_vendor(document_id, Utc::now())).await;
    match result {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({ "sent_to_vendor": count })),
        )
            .into_response(),
        Err(e) => errors::issue_error_to_response(e),
    }
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CancelRequestBody>,
) -> axum::response::Response {
    let document_id = match parse_document_id(&id) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let reason = body.reason.unwrap_or_else(|| "cancelled".to_string());

    let result = run_blocking(services, move |s| {
        s.cancel_serials(document_id, &reason, Utc::now())
    })
    .await;
    match result {
        Ok(count) => (
            StatusCode::OK,
            Json(serde_json::json!({ "cancelled": count })),
        )
            .into_response(),
        Err(e) => errors::issue_error_to_response(e),
    }
}
