use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use serialforge_codec::ChannelCode;
use serialforge_core::VendorId;
use serialforge_infra::registry::SupplierEntry;

use crate::app::routes::common::run_blocking;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(register))
        .route("/:vendor_id/code", get(code_for_vendor))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterSupplierBody>,
) -> axum::response::Response {
    let code = match dto::parse_supplier_code(&body.code) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let channel = match body.channel {
        Some(value) => match ChannelCode::new(&value) {
            Ok(channel) => Some(channel),
            Err(e) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    e.to_string(),
                )
            }
        },
        None => None,
    };
    let entry = SupplierEntry {
        code,
        vendor_id: body.vendor_id,
        channel,
    };

    let result = run_blocking(services, move |s| s.register_supplier(entry)).await;
    match result {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}

pub async fn code_for_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(vendor_id): Path<String>,
) -> axum::response::Response {
    let vendor_id: VendorId = match vendor_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor id")
        }
    };

    let result = run_blocking(services, move |s| s.code_for_vendor(vendor_id)).await;
    match result {
        Ok(code) => (
            StatusCode::OK,
            Json(serde_json::json!({ "code": code })),
        )
            .into_response(),
        Err(e) => errors::registry_error_to_response(e),
    }
}
