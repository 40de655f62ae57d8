use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use serialforge_codec::{IssueDate, ModelCode, SupplierCode};
use serialforge_core::{DocumentId, ItemType};
use serialforge_infra::issuance::{BatchResult, IssueLine, IssueRequest};
use serialforge_infra::scan::ScanOutcome;
use serialforge_infra::serial_store::StatusCounts;
use serialforge_serials::SerialRecord;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct IssueLineBody {
    pub model_code: String,
    pub item_type: String,
    pub quantity: u64,
    pub product_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueRequestBody {
    /// Issuing document; generated when absent.
    pub document_id: Option<DocumentId>,
    pub supplier_code: String,
    pub year: i32,
    pub month: u8,
    pub lines: Vec<IssueLineBody>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequestBody {
    pub supplier_code: String,
    pub model_code: String,
    pub item_type: String,
    pub quantity: u64,
    pub year: i32,
    pub month: u8,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequestBody {
    pub barcode: String,
    pub receiving_document_id: DocumentId,
}

#[derive(Debug, Deserialize)]
pub struct BulkScanRequestBody {
    pub barcodes: Vec<String>,
    pub receiving_document_id: DocumentId,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequestBody {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSupplierBody {
    pub code: String,
    pub vendor_id: serialforge_core::VendorId,
    pub channel: Option<String>,
}

// -------------------------
// Body -> domain conversion
// -------------------------

fn bad_request(message: impl Into<String>) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn parse_item_type(s: &str) -> Result<ItemType, axum::response::Response> {
    s.parse::<ItemType>().map_err(|e| bad_request(e.to_string()))
}

pub fn parse_model_code(s: &str) -> Result<ModelCode, axum::response::Response> {
    ModelCode::new(s).map_err(|e| bad_request(e.to_string()))
}

pub fn parse_supplier_code(s: &str) -> Result<SupplierCode, axum::response::Response> {
    SupplierCode::new(s).map_err(|e| bad_request(e.to_string()))
}

pub fn parse_issue_date(year: i32, month: u8) -> Result<IssueDate, axum::response::Response> {
    IssueDate::new(year, month).map_err(|e| bad_request(e.to_string()))
}

pub fn issue_request(body: IssueRequestBody) -> Result<IssueRequest, axum::response::Response> {
    let supplier_code = parse_supplier_code(&body.supplier_code)?;
    let issued_on = parse_issue_date(body.year, body.month)?;

    let mut lines = Vec::with_capacity(body.lines.len());
    for line in body.lines {
        lines.push(IssueLine {
            model_code: parse_model_code(&line.model_code)?,
            item_type: parse_item_type(&line.item_type)?,
            quantity: line.quantity,
            product_ref: line.product_ref,
        });
    }

    Ok(IssueRequest {
        document_id: body.document_id.unwrap_or_default(),
        supplier_code,
        issued_on,
        lines,
    })
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn batch_to_json(batch: BatchResult) -> serde_json::Value {
    json!({
        "document_id": batch.document_id,
        "total_issued": batch.total_issued,
        "lines": batch.lines.iter().map(|line| json!({
            "model_code": line.model_code,
            "item_type": line.item_type,
            "quantity": line.quantity,
            "start": line.start,
            "end": line.end,
            "first_barcode": line.first_barcode,
            "last_barcode": line.last_barcode,
        })).collect::<Vec<_>>(),
    })
}

pub fn record_to_json(record: &SerialRecord) -> serde_json::Value {
    serde_json::to_value(record).unwrap_or_else(|_| json!({}))
}

pub fn outcome_to_json(outcome: &ScanOutcome) -> serde_json::Value {
    match outcome {
        ScanOutcome::Accepted { record } => json!({
            "outcome": "accepted",
            "record": record_to_json(record),
        }),
        ScanOutcome::Rejected { barcode, reason } => json!({
            "outcome": "rejected",
            "barcode": barcode,
            "reason": reason,
        }),
    }
}

pub fn counts_to_json(counts: &StatusCounts) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = counts
        .iter()
        .map(|(status, count)| (status.as_str().to_string(), json!(count)))
        .collect();
    serde_json::Value::Object(map)
}
