use std::collections::HashMap;
use std::sync::RwLock;

use serialforge_codec::ModelCode;
use serialforge_core::ItemType;
use serialforge_sequences::{ProductSequence, SequenceKey, SerialRange};

use super::r#trait::{SequenceStatus, SequenceStore, SequenceStoreError};

/// In-memory counter store.
///
/// The write lock is the atomic unit of work: lazy creation and the
/// increment happen under one critical section, which is exactly the
/// guarantee the Postgres implementation gets from its conditional UPDATE.
/// Intended for tests/dev and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    sequences: RwLock<HashMap<SequenceKey, ProductSequence>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a counter with a non-default ceiling (operator action).
    pub fn set_max_serial(&self, model_code: &ModelCode, item_type: ItemType, max_serial: u64) {
        let key = SequenceKey::new(model_code.clone(), item_type);
        let mut sequences = match self.sequences.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sequences
            .entry(key)
            .or_insert_with(|| ProductSequence::new(model_code.clone(), item_type))
            .max_serial = max_serial;
    }
}

impl SequenceStore for InMemorySequenceStore {
    fn reserve(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        let key = SequenceKey::new(model_code.clone(), item_type);
        let mut sequences = self
            .sequences
            .write()
            .map_err(|_| SequenceStoreError::Backend("lock poisoned".to_string()))?;

        let sequence = sequences
            .entry(key)
            .or_insert_with(|| ProductSequence::new(model_code.clone(), item_type));
        let range = sequence.reserve(quantity)?;
        Ok(range)
    }

    fn preview(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        let key = SequenceKey::new(model_code.clone(), item_type);
        let sequences = self
            .sequences
            .read()
            .map_err(|_| SequenceStoreError::Backend("lock poisoned".to_string()))?;

        // An absent counter previews exactly as a fresh one would reserve.
        match sequences.get(&key) {
            Some(sequence) => Ok(sequence.peek(quantity)?),
            None => Ok(ProductSequence::new(model_code.clone(), item_type).peek(quantity)?),
        }
    }

    fn status(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
    ) -> Result<SequenceStatus, SequenceStoreError> {
        let key = SequenceKey::new(model_code.clone(), item_type);
        let sequences = self
            .sequences
            .read()
            .map_err(|_| SequenceStoreError::Backend("lock poisoned".to_string()))?;

        Ok(match sequences.get(&key) {
            Some(sequence) => SequenceStatus {
                last_serial: sequence.last_serial,
                next_serial: sequence.next_serial(),
                total_generated: sequence.total_generated,
            },
            None => SequenceStatus {
                last_serial: 0,
                next_serial: 1,
                total_generated: 0,
            },
        })
    }
}
