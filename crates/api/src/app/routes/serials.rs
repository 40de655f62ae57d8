use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::app::routes::common::run_blocking;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/issue", post(issue))
        .route("/preview", post(preview))
        .route("/scan", post(scan))
        .route("/scan/bulk", post(bulk_scan))
        .route("/:barcode", get(lookup))
}

pub async fn issue(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::IssueRequestBody>,
) -> axum::response::Response {
    let request = match dto::issue_request(body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = run_blocking(services, move |s| s.issue(&request, Utc::now())).await;
    match result {
        Ok(batch) => (StatusCode::CREATED, Json(dto::batch_to_json(batch))).into_response(),
        Err(e) => errors::issue_error_to_response(e),
    }
}

pub async fn preview(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::PreviewRequestBody>,
) -> axum::response::Response {
    let supplier_code = match dto::parse_supplier_code(&body.supplier_code) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let model_code = match dto::parse_model_code(&body.model_code) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let item_type = match dto::parse_item_type(&body.item_type) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let issued_on = match dto::parse_issue_date(body.year, body.month) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let quantity = body.quantity;

    let result = run_blocking(services, move |s| {
        s.preview_codes(&supplier_code, &model_code, item_type, quantity, issued_on)
    })
    .await;
    match result {
        Ok(codes) => (
            StatusCode::OK,
            Json(serde_json::json!({ "codes": codes })),
        )
            .into_response(),
        Err(e) => errors::issue_error_to_response(e),
    }
}

pub async fn scan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ScanRequestBody>,
) -> axum::response::Response {
    let outcome = run_blocking(services, move |s| {
        s.scan(&body.barcode, body.receiving_document_id, Utc::now())
    })
    .await;
    (StatusCode::OK, Json(dto::outcome_to_json(&outcome))).into_response()
}

pub async fn bulk_scan(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::BulkScanRequestBody>,
) -> axum::response::Response {
    let outcomes = run_blocking(services, move |s| {
        s.bulk_scan(&body.barcodes, body.receiving_document_id, Utc::now())
    })
    .await;
    let outcomes = outcomes
        .iter()
        .map(dto::outcome_to_json)
        .collect::<Vec<_>>();
    (
        StatusCode::OK,
        Json(serde_json::json!({ "outcomes": outcomes })),
    )
        .into_response()
}

pub async fn lookup(
    Extension(services): Extension<Arc<AppServices>>,
    Path(barcode): Path<String>,
) -> axum::response::Response {
    let result = run_blocking(services, move |s| s.lookup(&barcode)).await;
    match result {
        Ok(record) => (StatusCode::OK, Json(dto::record_to_json(&record))).into_response(),
        Err(e) => errors::issue_error_to_response(e),
    }
}
