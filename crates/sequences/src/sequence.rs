use serde::{Deserialize, Serialize};
use thiserror::Error;

use serialforge_codec::{ModelCode, SerialNumber};
use serialforge_core::ItemType;

/// Default counter ceiling: the 8-digit serial segment's maximum.
pub const DEFAULT_MAX_SERIAL: u64 = SerialNumber::MAX;

/// Error raised by range reservation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// The counter would pass its ceiling. No mutation has happened; the
    /// ceiling must be raised (or the model retired) by an operator.
    #[error(
        "sequence overflow for {model}/{item_type}: last_serial {last_serial} + {requested} exceeds max_serial {max_serial}"
    )]
    Overflow {
        model: ModelCode,
        item_type: ItemType,
        last_serial: u64,
        max_serial: u64,
        requested: u64,
    },

    /// A reservation of zero serial numbers is meaningless.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Key of one counter row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceKey {
    pub model_code: ModelCode,
    pub item_type: ItemType,
}

impl SequenceKey {
    pub fn new(model_code: ModelCode, item_type: ItemType) -> Self {
        Self {
            model_code,
            item_type,
        }
    }
}

/// A contiguous, inclusive block of reserved serial numbers.
///
/// The holder owns exclusive rights to every integer in `[start, end]`; a
/// range is never handed out twice, even if the holder fails to materialize
/// records for it (failed issuances burn serial numbers).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialRange {
    pub start: u64,
    pub end: u64,
}

impl SerialRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false // a constructed range always holds at least one serial
    }

    /// Iterate every serial number in the range.
    pub fn iter(&self) -> core::ops::RangeInclusive<u64> {
        self.start..=self.end
    }
}

/// One counter row: the only shared mutable state of the issuance core.
///
/// Invariants: `0 <= last_serial <= max_serial`; `last_serial` only ever
/// increases; rows are created lazily and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSequence {
    pub key: SequenceKey,
    pub last_serial: u64,
    pub max_serial: u64,
    pub total_generated: u64,
}

impl ProductSequence {
    /// Fresh counter starting at zero with the default ceiling.
    pub fn new(model_code: ModelCode, item_type: ItemType) -> Self {
        Self {
            key: SequenceKey::new(model_code, item_type),
            last_serial: 0,
            max_serial: DEFAULT_MAX_SERIAL,
            total_generated: 0,
        }
    }

    pub fn with_max_serial(mut self, max_serial: u64) -> Self {
        self.max_serial = max_serial;
        self
    }

    /// Next serial number this counter would hand out.
    pub fn next_serial(&self) -> u64 {
        self.last_serial + 1
    }

    /// Claim the next `quantity` serial numbers.
    ///
    /// Overflow is detected before any mutation: on error the counter is
    /// untouched. Callers must run this inside their atomic unit of work.
    pub fn reserve(&mut self, quantity: u64) -> Result<SerialRange, SequenceError> {
        let range = self.peek(quantity)?;
        self.last_serial = range.end;
        self.total_generated += quantity;
        Ok(range)
    }

    /// Compute what [`Self::reserve`] would return without mutating anything.
    pub fn peek(&self, quantity: u64) -> Result<SerialRange, SequenceError> {
        if quantity == 0 {
            return Err(SequenceError::InvalidQuantity);
        }
        // A request large enough to wrap u64 is overflow by definition, so
        // the failed checked_add reports the same error as an exhausted
        // counter.
        let end = self
            .last_serial
            .checked_add(quantity)
            .filter(|end| *end <= self.max_serial)
            .ok_or_else(|| SequenceError::Overflow {
                model: self.key.model_code.clone(),
                item_type: self.key.item_type,
                last_serial: self.last_serial,
                max_serial: self.max_serial,
                requested: quantity,
            })?;
        Ok(SerialRange {
            start: self.last_serial + 1,
            end,
        })
    }
}
