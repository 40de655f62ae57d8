//! Postgres-backed counter store.
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE product_sequences (
//!     model_code      TEXT    NOT NULL,
//!     item_type       TEXT    NOT NULL,
//!     last_serial     BIGINT  NOT NULL DEFAULT 0 CHECK (last_serial >= 0),
//!     max_serial      BIGINT  NOT NULL,
//!     total_generated BIGINT  NOT NULL DEFAULT 0,
//!     PRIMARY KEY (model_code, item_type),
//!     CHECK (last_serial <= max_serial)
//! );
//! ```
//!
//! The reservation is a single conditional `UPDATE .. RETURNING`: the
//! database's row lock makes the read-increment-write atomic, so two
//! concurrent reservations for the same key serialize and never overlap.
//! Never reimplement this as "read row, add N, write back" in application
//! code; that reintroduces the race this store exists to prevent.

use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use serialforge_codec::ModelCode;
use serialforge_core::ItemType;
use serialforge_sequences::{SequenceError, SerialRange, DEFAULT_MAX_SERIAL};

use super::r#trait::{SequenceStatus, SequenceStore, SequenceStoreError};

/// Postgres-backed sequence store.
///
/// Thread safety comes from the sqlx connection pool (`Arc + Send + Sync`).
#[derive(Debug, Clone)]
pub struct PostgresSequenceStore {
    pool: Arc<PgPool>,
}

impl PostgresSequenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Reserve a range atomically, creating the counter row on first use.
    ///
    /// The `INSERT .. ON CONFLICT DO NOTHING` makes the create race benign:
    /// the loser simply proceeds against the existing row.
    #[instrument(skip(self), fields(model = %model_code, item_type = %item_type), err)]
    pub async fn reserve_range(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        if quantity == 0 {
            return Err(SequenceError::InvalidQuantity.into());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO product_sequences (model_code, item_type, last_serial, max_serial, total_generated)
            VALUES ($1, $2, 0, $3, 0)
            ON CONFLICT (model_code, item_type) DO NOTHING
            "#,
        )
        .bind(model_code.as_str())
        .bind(item_type.as_str())
        .bind(DEFAULT_MAX_SERIAL as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

        // A quantity past i64::MAX cannot be bound as BIGINT and can never
        // fit under max_serial anyway; skip the UPDATE so it falls through
        // to the overflow report below instead of binding a negative value.
        let row = match i64::try_from(quantity) {
            Err(_) => None,
            Ok(quantity) => sqlx::query(
                r#"
                UPDATE product_sequences
                SET last_serial = last_serial + $3,
                    total_generated = total_generated + $3
                WHERE model_code = $1 AND item_type = $2 AND last_serial + $3 <= max_serial
                RETURNING last_serial
                "#,
            )
            .bind(model_code.as_str())
            .bind(item_type.as_str())
            .bind(quantity)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| SequenceStoreError::Backend(e.to_string()))?,
        };

        match row {
            Some(row) => {
                let end = row.get::<i64, _>("last_serial") as u64;
                tx.commit()
                    .await
                    .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;
                Ok(SerialRange {
                    start: end - quantity + 1,
                    end,
                })
            }
            None => {
                // Overflow: the guarded UPDATE touched nothing. Read the row
                // (it exists after the insert) to report the counter state.
                let state = sqlx::query(
                    r#"
                    SELECT last_serial, max_serial FROM product_sequences
                    WHERE model_code = $1 AND item_type = $2
                    "#,
                )
                .bind(model_code.as_str())
                .bind(item_type.as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

                tx.rollback()
                    .await
                    .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

                Err(SequenceError::Overflow {
                    model: model_code.clone(),
                    item_type,
                    last_serial: state.get::<i64, _>("last_serial") as u64,
                    max_serial: state.get::<i64, _>("max_serial") as u64,
                    requested: quantity,
                }
                .into())
            }
        }
    }

    /// Run the reservation inside a transaction and roll it back: computes
    /// what the next range would be without ever leaking a committed
    /// increment.
    #[instrument(skip(self), fields(model = %model_code, item_type = %item_type), err)]
    pub async fn preview_range(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        if quantity == 0 {
            return Err(SequenceError::InvalidQuantity.into());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

        let row = sqlx::query(
            r#"
            SELECT last_serial, max_serial FROM product_sequences
            WHERE model_code = $1 AND item_type = $2
            FOR UPDATE
            "#,
        )
        .bind(model_code.as_str())
        .bind(item_type.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

        let (last_serial, max_serial) = match row {
            Some(row) => (
                row.get::<i64, _>("last_serial") as u64,
                row.get::<i64, _>("max_serial") as u64,
            ),
            None => (0, DEFAULT_MAX_SERIAL),
        };

        tx.rollback()
            .await
            .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

        let end = last_serial
            .checked_add(quantity)
            .filter(|end| *end <= max_serial)
            .ok_or_else(|| SequenceError::Overflow {
                model: model_code.clone(),
                item_type,
                last_serial,
                max_serial,
                requested: quantity,
            })?;
        Ok(SerialRange {
            start: last_serial + 1,
            end,
        })
    }

    #[instrument(skip(self), fields(model = %model_code, item_type = %item_type), err)]
    pub async fn sequence_status(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
    ) -> Result<SequenceStatus, SequenceStoreError> {
        let row = sqlx::query(
            r#"
            SELECT last_serial, total_generated FROM product_sequences
            WHERE model_code = $1 AND item_type = $2
            "#,
        )
        .bind(model_code.as_str())
        .bind(item_type.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| SequenceStoreError::Backend(e.to_string()))?;

        Ok(match row {
            Some(row) => {
                let last_serial = row.get::<i64, _>("last_serial") as u64;
                SequenceStatus {
                    last_serial,
                    next_serial: last_serial + 1,
                    total_generated: row.get::<i64, _>("total_generated") as u64,
                }
            }
            None => SequenceStatus {
                last_serial: 0,
                next_serial: 1,
                total_generated: 0,
            },
        })
    }

    fn runtime_handle() -> Result<tokio::runtime::Handle, SequenceStoreError> {
        tokio::runtime::Handle::try_current().map_err(|_| {
            SequenceStoreError::Backend(
                "PostgresSequenceStore requires a tokio runtime context".to_string(),
            )
        })
    }
}

impl SequenceStore for PostgresSequenceStore {
    fn reserve(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        // The trait is synchronous; bridge into the async pool the same way
        // the rest of the Postgres adapters do.
        Self::runtime_handle()?.block_on(self.reserve_range(model_code, item_type, quantity))
    }

    fn preview(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
        quantity: u64,
    ) -> Result<SerialRange, SequenceStoreError> {
        Self::runtime_handle()?.block_on(self.preview_range(model_code, item_type, quantity))
    }

    fn status(
        &self,
        model_code: &ModelCode,
        item_type: ItemType,
    ) -> Result<SequenceStatus, SequenceStoreError> {
        Self::runtime_handle()?.block_on(self.sequence_status(model_code, item_type))
    }
}
