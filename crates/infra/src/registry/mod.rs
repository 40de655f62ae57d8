//! Supplier/Channel registry: vendor → 2-letter supplier code, and supplier
//! code → sales channel for spare-part barcodes.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemorySupplierRegistry;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSupplierRegistry;
pub use r#trait::{RegistryError, SupplierEntry, SupplierRegistry};
