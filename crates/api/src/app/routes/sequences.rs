use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::routes::common::run_blocking;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/:model/:item_type", get(status))
}

pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
    Path((model, item_type)): Path<(String, String)>,
) -> axum::response::Response {
    let model_code = match dto::parse_model_code(&model) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let item_type = match dto::parse_item_type(&item_type) {
        Ok(v) => v,
        Err(response) => return response,
    };

    let result = run_blocking(services, move |s| s.sequence_status(&model_code, item_type)).await;
    match result {
        Ok(status) => (StatusCode::OK, Json(serde_json::json!(status))).into_response(),
        Err(e) => errors::issue_error_to_response(e),
    }
}
