//! Postgres-backed supplier registry.
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE supplier_codes (
//!     code      TEXT PRIMARY KEY,
//!     vendor_id UUID NOT NULL UNIQUE,
//!     channel   TEXT
//! );
//! ```
//!
//! The primary key enforces code uniqueness at the database level; a `23505`
//! on insert maps to `CodeTaken`.

use std::sync::Arc;

use sqlx::{PgPool, Row};
use tracing::instrument;

use serialforge_codec::{ChannelCode, SupplierCode};
use serialforge_core::VendorId;

use super::r#trait::{RegistryError, SupplierEntry, SupplierRegistry};

#[derive(Debug, Clone)]
pub struct PostgresSupplierRegistry {
    pool: Arc<PgPool>,
    default_channel: ChannelCode,
}

impl PostgresSupplierRegistry {
    pub fn new(pool: PgPool, default_channel: ChannelCode) -> Self {
        Self {
            pool: Arc::new(pool),
            default_channel,
        }
    }

    #[instrument(skip(self, entry), fields(code = %entry.code), err)]
    pub async fn insert_entry(&self, entry: SupplierEntry) -> Result<(), RegistryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO supplier_codes (code, vendor_id, channel)
            VALUES ($1, $2, $3)
            ON CONFLICT (code) DO UPDATE SET channel = EXCLUDED.channel
            WHERE supplier_codes.vendor_id = EXCLUDED.vendor_id
            "#,
        )
        .bind(entry.code.as_str())
        .bind(entry.vendor_id.as_uuid())
        .bind(entry.channel.as_ref().map(|c| c.as_str().to_string()))
        .execute(&*self.pool)
        .await
        .map_err(|e| RegistryError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Conflicting code held by a different vendor: report the holder.
            let row = sqlx::query("SELECT vendor_id FROM supplier_codes WHERE code = $1")
                .bind(entry.code.as_str())
                .fetch_one(&*self.pool)
                .await
                .map_err(|e| RegistryError::Backend(e.to_string()))?;
            return Err(RegistryError::CodeTaken {
                code: entry.code,
                vendor_id: VendorId::from_uuid(row.get("vendor_id")),
            });
        }
        Ok(())
    }

    #[instrument(skip(self), fields(vendor_id = %vendor_id), err)]
    pub async fn fetch_code(&self, vendor_id: VendorId) -> Result<SupplierCode, RegistryError> {
        let row = sqlx::query("SELECT code FROM supplier_codes WHERE vendor_id = $1")
            .bind(vendor_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))?
            .ok_or(RegistryError::VendorNotFound(vendor_id))?;

        let code: String = row.get("code");
        SupplierCode::new(&code).map_err(|e| RegistryError::Backend(e.to_string()))
    }

    #[instrument(skip(self), fields(code = %code), err)]
    pub async fn fetch_channel(&self, code: &SupplierCode) -> Result<ChannelCode, RegistryError> {
        let row = sqlx::query("SELECT channel FROM supplier_codes WHERE code = $1")
            .bind(code.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))?;

        let channel: Option<String> = match row {
            Some(row) => row.get("channel"),
            None => None,
        };
        match channel {
            Some(value) => {
                ChannelCode::new(&value).map_err(|e| RegistryError::Backend(e.to_string()))
            }
            None => Ok(self.default_channel.clone()),
        }
    }

    fn runtime_handle() -> Result<tokio::runtime::Handle, RegistryError> {
        tokio::runtime::Handle::try_current().map_err(|_| {
            RegistryError::Backend(
                "PostgresSupplierRegistry requires a tokio runtime context".to_string(),
            )
        })
    }
}

impl SupplierRegistry for PostgresSupplierRegistry {
    fn register(&self, entry: SupplierEntry) -> Result<(), RegistryError> {
        Self::runtime_handle()?.block_on(self.insert_entry(entry))
    }

    fn code_for_vendor(&self, vendor_id: VendorId) -> Result<SupplierCode, RegistryError> {
        Self::runtime_handle()?.block_on(self.fetch_code(vendor_id))
    }

    fn channel_for_supplier(&self, code: &SupplierCode) -> Result<ChannelCode, RegistryError> {
        Self::runtime_handle()?.block_on(self.fetch_channel(code))
    }
}
