//! Per-unit record persistence and lifecycle enforcement.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemorySerialStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSerialStore;
pub use r#trait::{SerialRecordStore, SerialStoreError, StatusCounts};
