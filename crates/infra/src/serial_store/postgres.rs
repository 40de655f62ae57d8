//! Postgres-backed serial record store.
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE serial_records (
//!     barcode             TEXT PRIMARY KEY,
//!     issuing_document_id UUID NOT NULL,
//!     status              TEXT NOT NULL,
//!     record              JSONB NOT NULL
//! );
//! CREATE INDEX serial_records_by_document ON serial_records (issuing_document_id);
//! ```
//!
//! ## Error mapping
//!
//! | PostgreSQL error | Code | Mapped to | Scenario |
//! |------------------|------|-----------|----------|
//! | unique violation | `23505` | `DuplicateBarcode` | allocator invariant broken |
//! | anything else    | n/a       | `Backend` | connectivity, pool closed, ... |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{error, instrument};

use serialforge_core::DocumentId;
use serialforge_serials::{SerialRecord, SerialStatus, Transition};

use super::r#trait::{SerialRecordStore, SerialStoreError, StatusCounts};

/// Postgres-backed record store. Records persist as one JSONB document per
/// row plus the columns queries filter on.
#[derive(Debug, Clone)]
pub struct PostgresSerialStore {
    pool: Arc<PgPool>,
}

impl PostgresSerialStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self, records), fields(batch = records.len()), err)]
    pub async fn insert_batch(&self, records: Vec<SerialRecord>) -> Result<(), SerialStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))?;

        for record in &records {
            let payload = serde_json::to_value(record)
                .map_err(|e| SerialStoreError::Backend(e.to_string()))?;
            let result = sqlx::query(
                r#"
                INSERT INTO serial_records (barcode, issuing_document_id, status, record)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&record.barcode)
            .bind(record.issuing_document_id.as_uuid())
            .bind(record.status.as_str())
            .bind(&payload)
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                // Transaction drop rolls back everything inserted so far.
                return Err(map_insert_error(&record.barcode, e));
            }
        }

        tx.commit()
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))
    }

    #[instrument(skip(self), err)]
    pub async fn fetch(&self, barcode: &str) -> Result<SerialRecord, SerialStoreError> {
        let row = sqlx::query("SELECT record FROM serial_records WHERE barcode = $1")
            .bind(barcode)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))?
            .ok_or_else(|| SerialStoreError::NotFound(barcode.to_string()))?;

        deserialize_record(row.get("record"))
    }

    #[instrument(skip(self, transition), fields(target = %transition.target_status()), err)]
    pub async fn apply_transition(
        &self,
        barcode: &str,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<SerialRecord, SerialStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))?;

        let row = sqlx::query("SELECT record FROM serial_records WHERE barcode = $1 FOR UPDATE")
            .bind(barcode)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))?
            .ok_or_else(|| SerialStoreError::NotFound(barcode.to_string()))?;

        let mut record = deserialize_record(row.get("record"))?;
        record.apply(transition, occurred_at)?;

        persist_record(&mut tx, &record).await?;
        tx.commit()
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))?;
        Ok(record)
    }

    #[instrument(skip(self), fields(document_id = %document_id), err)]
    pub async fn status_counts(
        &self,
        document_id: DocumentId,
    ) -> Result<StatusCounts, SerialStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS n FROM serial_records
            WHERE issuing_document_id = $1
            GROUP BY status
            "#,
        )
        .bind(document_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| SerialStoreError::Backend(e.to_string()))?;

        let mut counts = StatusCounts::new();
        for row in rows {
            let status: String = row.get("status");
            let status = parse_status(&status)?;
            counts.insert(status, row.get::<i64, _>("n") as u64);
        }
        Ok(counts)
    }

    #[instrument(skip(self, transition), fields(document_id = %document_id, target = %transition.target_status()), err)]
    pub async fn apply_for_document(
        &self,
        document_id: DocumentId,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<u64, SerialStoreError> {
        let target = transition.target_status();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))?;

        let rows = sqlx::query(
            "SELECT record FROM serial_records WHERE issuing_document_id = $1 FOR UPDATE",
        )
        .bind(document_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| SerialStoreError::Backend(e.to_string()))?;

        let mut transitioned = 0u64;
        for row in rows {
            let mut record = deserialize_record(row.get("record"))?;
            if !record.status.allows(target) {
                continue;
            }
            record.apply(transition, occurred_at)?;
            persist_record(&mut tx, &record).await?;
            transitioned += 1;
        }

        tx.commit()
            .await
            .map_err(|e| SerialStoreError::Backend(e.to_string()))?;
        Ok(transitioned)
    }

    fn runtime_handle() -> Result<tokio::runtime::Handle, SerialStoreError> {
        tokio::runtime::Handle::try_current().map_err(|_| {
            SerialStoreError::Backend(
                "PostgresSerialStore requires a tokio runtime context".to_string(),
            )
        })
    }
}

async fn persist_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    record: &SerialRecord,
) -> Result<(), SerialStoreError> {
    let payload =
        serde_json::to_value(record).map_err(|e| SerialStoreError::Backend(e.to_string()))?;
    sqlx::query("UPDATE serial_records SET status = $2, record = $3 WHERE barcode = $1")
        .bind(&record.barcode)
        .bind(record.status.as_str())
        .bind(&payload)
        .execute(&mut **tx)
        .await
        .map_err(|e| SerialStoreError::Backend(e.to_string()))?;
    Ok(())
}

fn deserialize_record(value: serde_json::Value) -> Result<SerialRecord, SerialStoreError> {
    serde_json::from_value(value).map_err(|e| SerialStoreError::Backend(e.to_string()))
}

fn parse_status(status: &str) -> Result<SerialStatus, SerialStoreError> {
    serde_json::from_value(serde_json::Value::String(status.to_string()))
        .map_err(|e| SerialStoreError::Backend(format!("unknown status '{status}': {e}")))
}

fn map_insert_error(barcode: &str, e: sqlx::Error) -> SerialStoreError {
    if let Some(db) = e.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            error!(barcode, "duplicate barcode on insert: allocator exclusivity is broken");
            return SerialStoreError::DuplicateBarcode(barcode.to_string());
        }
    }
    SerialStoreError::Backend(e.to_string())
}

impl SerialRecordStore for PostgresSerialStore {
    fn create_batch(&self, records: Vec<SerialRecord>) -> Result<(), SerialStoreError> {
        Self::runtime_handle()?.block_on(self.insert_batch(records))
    }

    fn lookup(&self, barcode: &str) -> Result<SerialRecord, SerialStoreError> {
        Self::runtime_handle()?.block_on(self.fetch(barcode))
    }

    fn transition(
        &self,
        barcode: &str,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<SerialRecord, SerialStoreError> {
        Self::runtime_handle()?.block_on(self.apply_transition(barcode, transition, occurred_at))
    }

    fn counts_by_status(&self, document_id: DocumentId) -> Result<StatusCounts, SerialStoreError> {
        Self::runtime_handle()?.block_on(self.status_counts(document_id))
    }

    fn transition_for_document(
        &self,
        document_id: DocumentId,
        transition: &Transition,
        occurred_at: DateTime<Utc>,
    ) -> Result<u64, SerialStoreError> {
        Self::runtime_handle()?
            .block_on(self.apply_for_document(document_id, transition, occurred_at))
    }
}
