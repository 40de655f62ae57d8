//! Atomic range-reservation boundary.
//!
//! This is the single synchronization point of the whole core: every
//! uniqueness guarantee reduces to `reserve` being atomic per
//! (model_code, item_type) key.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemorySequenceStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSequenceStore;
pub use r#trait::{SequenceStatus, SequenceStore, SequenceStoreError};
