use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::error;

use serialforge_core::DocumentId;
use serialforge_serials::{SerialRecord, Transition};

use super::r#trait::{SerialRecordStore, SerialStoreError, StatusCounts};

/// In-memory serial record store, keyed by barcode.
///
/// Intended for tests/dev and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySerialStore {
    records: RwLock<HashMap<String, SerialRecord>>,
}

impl InMemorySerialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked_write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, SerialRecord>>, SerialStoreError>
    {
        self.records
            .write()
            .map_err(|_| SerialStoreError::Backend("lock poisoned".to_string()))
    }

    fn locked_read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, SerialRecord>>, SerialStoreError>
    {
        self.records
            .read()
            .map_err(|_| SerialStoreError::Backend("lock poisoned".to_string()))
    }
}

impl SerialRecordStore for InMemorySerialStore {
    fn create_batch(&self, records: Vec<SerialRecord>) -> Result<(), SerialStoreError> {
        let mut map = self.locked_write()?;

        // Check the whole batch before inserting anything.
        let mut seen = std::collections::HashSet::new();
        for record in &records {
            if map.contains_key(&record.barcode) || !seen.insert(record.barcode.clone()) {
                error!(
                    barcode = %record.barcode,
                    "duplicate barcode on insert: allocator exclusivity is broken"
                );
                return Err(SerialStoreError::DuplicateBarcode(record.barcode.clone()));
            }
        }

        for record in records {
            map.insert(record.barcode.clone(), record);
        }
        Ok(())
    }

    fn lookup(&self, barcode: &str) -> Result<SerialRecord, SerialStoreError> {
        self.locked_read()?
            .get(barcode)
            .cloned()
            .ok_or_else(|| SerialStoreError::NotFound(barcode.to_string()))
    }

    fn transition(
        &self,
        barcode: &str,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<SerialRecord, SerialStoreError> {
        let mut map = self.locked_write()?;
        let record = map
            .get_mut(barcode)
            .ok_or_else(|| SerialStoreError::NotFound(barcode.to_string()))?;
        record.apply(transition, occurred_at)?;
        Ok(record.clone())
    }

    fn counts_by_status(&self, document_id: DocumentId) -> Result<StatusCounts, SerialStoreError> {
        let map = self.locked_read()?;
        let mut counts = StatusCounts::new();
        for record in map.values() {
            if record.issuing_document_id == document_id {
                *counts.entry(record.status).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    fn transition_for_document(
        &self,
        document_id: DocumentId,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<u64, SerialStoreError> {
        let target = transition.target_status();
        let mut map = self.locked_write()?;
        let mut transitioned = 0;
        for record in map.values_mut() {
            if record.issuing_document_id == document_id && record.status.allows(target) {
                record.apply(transition, occurred_at)?;
                transitioned += 1;
            }
        }
        Ok(transitioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialforge_codec::{
        BrandPrefix, CodeFields, IssueDate, ModelCode, SerialNumber, SupplierCode,
    };
    use serialforge_core::ItemType;
    use serialforge_serials::{NewSerial, SerialStatus};

    fn record(document_id: DocumentId, serial: u64) -> SerialRecord {
        let model = ModelCode::new("IEL").unwrap();
        SerialRecord::generated(
            NewSerial {
                barcode: format!("APAAAIEL{serial:08}"),
                fields: CodeFields::FinishedGood {
                    brand: BrandPrefix::new("AP").unwrap(),
                    date: IssueDate::new(2026, 1).unwrap(),
                    model: model.clone(),
                    serial: SerialNumber::new(serial).unwrap(),
                },
                model_code: model,
                item_type: ItemType::FinishedGood,
                supplier_code: SupplierCode::new("TN").unwrap(),
                issuing_document_id: document_id,
                product_ref: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn create_then_lookup_round_trips() {
        let store = InMemorySerialStore::new();
        let doc = DocumentId::new();
        let rec = record(doc, 1);
        store.create_batch(vec![rec.clone()]).unwrap();
        assert_eq!(store.lookup(&rec.barcode).unwrap(), rec);
    }

    #[test]
    fn duplicate_barcode_rejects_the_whole_batch() {
        let store = InMemorySerialStore::new();
        let doc = DocumentId::new();
        store.create_batch(vec![record(doc, 1)]).unwrap();

        let err = store
            .create_batch(vec![record(doc, 2), record(doc, 1)])
            .unwrap_err();
        assert!(matches!(err, SerialStoreError::DuplicateBarcode(_)));
        // Nothing from the failed batch landed.
        assert!(matches!(
            store.lookup("APAAAIEL00000002").unwrap_err(),
            SerialStoreError::NotFound(_)
        ));
    }

    #[test]
    fn unknown_barcode_is_not_found() {
        let store = InMemorySerialStore::new();
        assert!(matches!(
            store.lookup("APAAAIEL00000099").unwrap_err(),
            SerialStoreError::NotFound(_)
        ));
        assert!(matches!(
            store
                .transition("APAAAIEL00000099", &Transition::Printed, Utc::now())
                .unwrap_err(),
            SerialStoreError::NotFound(_)
        ));
    }

    #[test]
    fn invalid_transition_leaves_record_unchanged() {
        let store = InMemorySerialStore::new();
        let doc = DocumentId::new();
        let rec = record(doc, 1);
        store.create_batch(vec![rec.clone()]).unwrap();

        let err = store
            .transition(
                &rec.barcode,
                &Transition::Received {
                    receiving_document_id: DocumentId::new(),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, SerialStoreError::Lifecycle(_)));
        assert_eq!(store.lookup(&rec.barcode).unwrap(), rec);
    }

    #[test]
    fn counts_by_status_scopes_to_the_document() {
        let store = InMemorySerialStore::new();
        let doc = DocumentId::new();
        let other = DocumentId::new();
        store
            .create_batch(vec![record(doc, 1), record(doc, 2), record(other, 3)])
            .unwrap();
        store
            .transition("APAAAIEL00000001", &Transition::Printed, Utc::now())
            .unwrap();

        let counts = store.counts_by_status(doc).unwrap();
        assert_eq!(counts.get(&SerialStatus::Generated), Some(&1));
        assert_eq!(counts.get(&SerialStatus::Printed), Some(&1));
        assert_eq!(counts.values().sum::<u64>(), 2);
    }

    #[test]
    fn document_wide_transition_skips_records_that_cannot_take_it() {
        let store = InMemorySerialStore::new();
        let doc = DocumentId::new();
        store
            .create_batch(vec![record(doc, 1), record(doc, 2), record(doc, 3)])
            .unwrap();
        // One record is already printed, so Printed only applies to the rest.
        store
            .transition("APAAAIEL00000001", &Transition::Printed, Utc::now())
            .unwrap();

        let count = store
            .transition_for_document(doc, &Transition::Printed, Utc::now())
            .unwrap();
        assert_eq!(count, 2);

        let counts = store.counts_by_status(doc).unwrap();
        assert_eq!(counts.get(&SerialStatus::Printed), Some(&3));
    }
}
