//! Scan/Validation gateway: drives the `Received` transition from physical
//! scan events during goods receipt.
//!
//! Scan outcomes are values, never errors: a receiving UI must be able to
//! keep scanning subsequent codes after a bad one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use serialforge_codec::{decode, CodecConfig};
use serialforge_core::DocumentId;
use serialforge_serials::{SerialRecord, Transition};

use crate::serial_store::{SerialRecordStore, SerialStoreError};

/// Result of validating one scanned code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The code was valid and is now `Received`.
    Accepted { record: SerialRecord },
    /// The code was rejected; `reason` is human-readable for the scanner UI.
    Rejected { barcode: String, reason: String },
}

impl ScanOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanOutcome::Accepted { .. })
    }

    fn rejected(barcode: &str, reason: impl Into<String>) -> Self {
        ScanOutcome::Rejected {
            barcode: barcode.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validates scanned codes against stored state during receiving.
pub struct ScanGateway<S> {
    serials: S,
    codec: CodecConfig,
}

impl<S: SerialRecordStore> ScanGateway<S> {
    pub fn new(serials: S, codec: CodecConfig) -> Self {
        Self { serials, codec }
    }

    /// Validate one scanned code and, if valid, mark it received.
    #[instrument(skip(self), fields(receiving_document_id = %receiving_document_id))]
    pub fn scan(
        &self,
        barcode: &str,
        receiving_document_id: DocumentId,
        occurred_at: DateTime<Utc>,
    ) -> ScanOutcome {
        // Structural check first: a mis-read scan should be reported as such
        // even before any lookup.
        if let Err(e) = decode(&self.codec, barcode) {
            debug!(barcode, error = %e, "scan rejected: malformed code");
            return ScanOutcome::rejected(barcode, format!("not a valid code: {e}"));
        }

        // The store keys records by the rendered (upper-case) code. Scanners
        // and manual entry may deliver lower case or padding; look up the
        // same canonical form the decode accepted.
        let canonical = barcode.trim().to_ascii_uppercase();

        let record = match self.serials.lookup(&canonical) {
            Ok(record) => record,
            Err(SerialStoreError::NotFound(_)) => {
                return ScanOutcome::rejected(&canonical, "unknown code: no record exists");
            }
            Err(e) => return ScanOutcome::rejected(&canonical, format!("lookup failed: {e}")),
        };

        if record.status.has_been_received() || record.status.is_terminal() {
            // Idempotent for anything at or past Received: same answer every
            // time, no state change.
            return ScanOutcome::rejected(
                &canonical,
                format!("already processed, current status {}", record.status),
            );
        }

        match self.serials.transition(
            &canonical,
            &Transition::Received {
                receiving_document_id,
            },
            occurred_at,
        ) {
            Ok(record) => ScanOutcome::Accepted { record },
            Err(SerialStoreError::Lifecycle(e)) => {
                ScanOutcome::rejected(&canonical, format!("not ready for receiving: {e}"))
            }
            Err(e) => ScanOutcome::rejected(&canonical, format!("receiving failed: {e}")),
        }
    }

    /// Validate a list of codes, one outcome per input, preserving order and
    /// never short-circuiting on a failure.
    pub fn bulk_scan(
        &self,
        barcodes: &[String],
        receiving_document_id: DocumentId,
        occurred_at: DateTime<Utc>,
    ) -> Vec<ScanOutcome> {
        barcodes
            .iter()
            .map(|barcode| self.scan(barcode, receiving_document_id, occurred_at))
            .collect()
    }
}
