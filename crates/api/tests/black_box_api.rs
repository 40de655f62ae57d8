//! Black-box tests: drive the router exactly as an HTTP client would.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use serialforge_api::app::services::build_in_memory_services;
use serialforge_api::app::build_app_with;

fn app() -> Router {
    build_app_with(Arc::new(build_in_memory_services()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn issue_body(quantity: u64) -> Value {
    json!({
        "supplier_code": "TN",
        "year": 2026,
        "month": 1,
        "lines": [{
            "model_code": "IEL",
            "item_type": "finished_good",
            "quantity": quantity,
        }],
    })
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn issue_then_lookup_then_receive() {
    let app = app();

    let (status, batch) = send(&app, "POST", "/serials/issue", Some(issue_body(2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(batch["total_issued"], 2);
    let first = batch["lines"][0]["first_barcode"].as_str().unwrap().to_string();
    assert_eq!(first, "APAAAIEL00000001");
    let document_id = batch["document_id"].as_str().unwrap().to_string();

    let (status, record) = send(&app, "GET", &format!("/serials/{first}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "generated");

    let (status, moved) = send(
        &app,
        "POST",
        &format!("/documents/{document_id}/sent-to-vendor"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["sent_to_vendor"], 2);

    let receiving = uuid::Uuid::now_v7().to_string();
    let (status, outcome) = send(
        &app,
        "POST",
        "/serials/scan",
        Some(json!({ "barcode": first, "receiving_document_id": receiving })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "accepted");
    assert_eq!(outcome["record"]["status"], "received");

    // Re-scan: rejected, not an error status.
    let (status, outcome) = send(
        &app,
        "POST",
        "/serials/scan",
        Some(json!({ "barcode": first, "receiving_document_id": receiving })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "rejected");

    let (status, counts) = send(
        &app,
        "GET",
        &format!("/documents/{document_id}/status-counts"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts["received"], 1);
    assert_eq!(counts["sent_to_vendor"], 1);
}

#[tokio::test]
async fn preview_does_not_advance_the_sequence() {
    let app = app();
    let preview = json!({
        "supplier_code": "TN",
        "model_code": "IEL",
        "item_type": "finished_good",
        "quantity": 2,
        "year": 2026,
        "month": 1,
    });

    let (status, first) = send(&app, "POST", "/serials/preview", Some(preview.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["codes"][0], "APAAAIEL00000001");

    let (_, second) = send(&app, "POST", "/serials/preview", Some(preview)).await;
    assert_eq!(first, second);

    let (status, sequence) = send(&app, "GET", "/sequences/IEL/finished_good", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sequence["last_serial"], 0);
}

#[tokio::test]
async fn malformed_requests_get_400() {
    let app = app();

    let (status, body) = send(
        &app,
        "POST",
        "/serials/issue",
        Some(json!({
            "supplier_code": "TOOLONG",
            "year": 2026,
            "month": 1,
            "lines": [],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send(&app, "POST", "/serials/issue", Some(json!({
        "supplier_code": "TN",
        "year": 2026,
        "month": 13,
        "lines": [],
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_issue_request_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/serials/issue",
        Some(json!({ "supplier_code": "TN", "year": 2026, "month": 1, "lines": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn unknown_barcode_is_404() {
    let app = app();
    let (status, body) = send(&app, "GET", "/serials/APAAAIEL00000042", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn cancel_document_reports_the_count() {
    let app = app();
    let (_, batch) = send(&app, "POST", "/serials/issue", Some(issue_body(3))).await;
    let document_id = batch["document_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/documents/{document_id}/cancel"),
        Some(json!({ "reason": "po voided" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], 3);
}

#[tokio::test]
async fn supplier_registration_and_conflicts() {
    let app = app();
    let vendor = uuid::Uuid::now_v7().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/suppliers",
        Some(json!({ "code": "TN", "vendor_id": vendor, "channel": "KB" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", &format!("/suppliers/{vendor}/code"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "TN");

    // Same code, different vendor: conflict.
    let other = uuid::Uuid::now_v7().to_string();
    let (status, body) = send(
        &app,
        "POST",
        "/suppliers",
        Some(json!({ "code": "TN", "vendor_id": other })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "code_taken");

    let (status, _) = send(&app, "GET", &format!("/suppliers/{other}/code"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_scan_reports_every_outcome() {
    let app = app();
    let (_, batch) = send(&app, "POST", "/serials/issue", Some(issue_body(1))).await;
    let document_id = batch["document_id"].as_str().unwrap().to_string();
    let barcode = batch["lines"][0]["first_barcode"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        &format!("/documents/{document_id}/sent-to-vendor"),
        None,
    )
    .await;

    let receiving = uuid::Uuid::now_v7().to_string();
    let (status, body) = send(
        &app,
        "POST",
        "/serials/scan/bulk",
        Some(json!({
            "barcodes": [barcode, "garbage"],
            "receiving_document_id": receiving,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let outcomes = body["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["outcome"], "accepted");
    assert_eq!(outcomes[1]["outcome"], "rejected");
}
