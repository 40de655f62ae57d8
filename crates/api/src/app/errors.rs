use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use serialforge_infra::issuance::IssueError;
use serialforge_infra::registry::RegistryError;
use serialforge_infra::sequence_store::SequenceStoreError;
use serialforge_infra::serial_store::SerialStoreError;
use serialforge_sequences::SequenceError;

pub fn issue_error_to_response(err: IssueError) -> axum::response::Response {
    // Line errors keep their position in the message but map by their cause.
    let message = err.to_string();
    let mut cause = &err;
    while let IssueError::Line { source, .. } = cause {
        cause = &**source;
    }

    let (status, code) = match cause {
        IssueError::EmptyRequest => (StatusCode::BAD_REQUEST, "validation_error"),
        IssueError::Codec(_) => (StatusCode::BAD_REQUEST, "codec_error"),
        IssueError::Sequence(SequenceStoreError::Sequence(SequenceError::Overflow { .. })) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "sequence_overflow")
        }
        IssueError::Sequence(SequenceStoreError::Sequence(_)) => {
            (StatusCode::BAD_REQUEST, "validation_error")
        }
        IssueError::Sequence(SequenceStoreError::Backend(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
        }
        IssueError::Store(SerialStoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
        IssueError::Store(SerialStoreError::Lifecycle(_)) => {
            (StatusCode::CONFLICT, "invalid_transition")
        }
        // Duplicate barcode means allocator exclusivity broke: a server fault.
        IssueError::Store(SerialStoreError::DuplicateBarcode(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "duplicate_barcode")
        }
        IssueError::Store(SerialStoreError::Backend(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
        }
        IssueError::Registry(e) => return registry_error_to_response(e.clone()),
        IssueError::Line { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
    };
    json_error(status, code, message)
}

pub fn registry_error_to_response(err: RegistryError) -> axum::response::Response {
    let message = err.to_string();
    let (status, code) = match err {
        RegistryError::CodeTaken { .. } => (StatusCode::CONFLICT, "code_taken"),
        RegistryError::VendorNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        RegistryError::Backend(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
    };
    json_error(status, code, message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
