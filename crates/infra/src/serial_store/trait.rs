use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use serialforge_core::DocumentId;
use serialforge_serials::{LifecycleError, SerialRecord, SerialStatus, Transition};

/// Counts per status for one issuing document, for progress displays that
/// must not scan every record.
pub type StatusCounts = HashMap<SerialStatus, u64>;

/// Error surface of the serial record store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerialStoreError {
    /// The rendered code already exists. Structurally unreachable while the
    /// allocator's exclusivity holds; if it ever occurs it is a fatal
    /// integrity violation and is surfaced loudly, never swallowed.
    #[error("duplicate barcode: {0}")]
    DuplicateBarcode(String),

    /// Unknown barcode.
    #[error("serial record not found: {0}")]
    NotFound(String),

    /// Lifecycle rule violation; the record was left exactly as it was.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The backing store failed.
    #[error("serial store backend error: {0}")]
    Backend(String),
}

/// Storage boundary for issued serial records.
///
/// Records have no contention: each barcode belongs to exactly one creator,
/// so this trait needs no reservation semantics, only the lifecycle rules.
pub trait SerialRecordStore: Send + Sync {
    /// Insert freshly minted records (status `Generated`). All-or-nothing:
    /// a duplicate anywhere in the batch inserts nothing.
    fn create_batch(&self, records: Vec<SerialRecord>) -> Result<(), SerialStoreError>;

    fn lookup(&self, barcode: &str) -> Result<SerialRecord, SerialStoreError>;

    /// Apply one lifecycle transition and return the updated record.
    fn transition(
        &self,
        barcode: &str,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<SerialRecord, SerialStoreError>;

    /// Status histogram of all records issued under a document.
    fn counts_by_status(&self, document_id: DocumentId) -> Result<StatusCounts, SerialStoreError>;

    /// Apply `transition` to every record of the issuing document whose
    /// current status permits it; returns how many were transitioned.
    /// Records that cannot take the transition are skipped, not errors.
    fn transition_for_document(
        &self,
        document_id: DocumentId,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<u64, SerialStoreError>;
}

impl<T: SerialRecordStore + ?Sized> SerialRecordStore for std::sync::Arc<T> {
    fn create_batch(&self, records: Vec<SerialRecord>) -> Result<(), SerialStoreError> {
        (**self).create_batch(records)
    }

    fn lookup(&self, barcode: &str) -> Result<SerialRecord, SerialStoreError> {
        (**self).lookup(barcode)
    }

    fn transition(
        &self,
        barcode: &str,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<SerialRecord, SerialStoreError> {
        (**self).transition(barcode, transition, occurred_at)
    }

    fn counts_by_status(&self, document_id: DocumentId) -> Result<StatusCounts, SerialStoreError> {
        (**self).counts_by_status(document_id)
    }

    fn transition_for_document(
        &self,
        document_id: DocumentId,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<u64, SerialStoreError> {
        (**self).transition_for_document(document_id, transition, occurred_at)
    }
}
