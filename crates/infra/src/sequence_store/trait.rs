use thiserror::Error;

use serialforge_codec::ModelCode;
use serialforge_core::ItemType;
use serialforge_sequences::{SequenceError, SerialRange};

/// Error surface of the sequence store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceStoreError {
    /// Domain rule failed (overflow, zero quantity). No mutation committed.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// The backing store failed (connectivity, poisoned lock, ...).
    #[error("sequence store backend error: {0}")]
    Backend(String),
}

/// Observable state of one counter, for collaborators and operators.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SequenceStatus {
    pub last_serial: u64,
    pub next_serial: u64,
    pub total_generated: u64,
}

/// Per-(model, item-type) counter storage with atomic range reservation.
///
/// `reserve` must run its read-increment-write as one atomic unit per key:
/// two concurrent callers for the same key observe a total order (the second
/// caller's start is the first caller's end + 1), callers for different keys
/// proceed independently. Rows are created lazily inside that same unit; the
/// loser of a create race retries against the now-existing row.
pub trait SequenceStore: Send + Sync {
    /// Claim the next `quantity` serial numbers for the key, creating the
    /// counter on first use. Overflow commits nothing.
    fn reserve(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError>;

    /// Compute what `reserve` would return without committing an increment.
    fn preview(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError>;

    /// Current counter state; absent counters read as all-zero (they are
    /// created lazily on first reservation, not here).
    fn status(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
    ) -> Result<SequenceStatus, SequenceStoreError>;
}

impl<T: SequenceStore + ?Sized> SequenceStore for std::sync::Arc<T> {
    fn reserve(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        (**self).reserve(model_code, item_type, quantity)
    }

    fn preview(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        (**self).preview(model_code, item_type, quantity)
    }

    fn status(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
    ) -> Result<SequenceStatus, SequenceStoreError> {
        (**self).status(model_code, item_type)
    }
}
