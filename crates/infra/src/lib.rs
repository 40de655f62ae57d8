//! Infrastructure layer: storage boundaries, the supplier registry, and the
//! application services built on top of them (issuance, scanning).
//!
//! Every storage concern follows the same split: a synchronous trait, an
//! in-memory implementation (tests/dev, also the default API wiring) and a
//! Postgres implementation backed by sqlx, compiled behind the `postgres`
//! feature.

pub mod issuance;
pub mod registry;
pub mod scan;
pub mod sequence_store;
pub mod serial_store;

#[cfg(test)]
mod integration_tests;

pub use issuance::{BatchResult, IssuanceService, IssueError, IssueLine, IssueRequest, LineResult};
pub use registry::{InMemorySupplierRegistry, RegistryError, SupplierEntry, SupplierRegistry};
pub use scan::{ScanGateway, ScanOutcome};
pub use sequence_store::{
    InMemorySequenceStore, SequenceStatus, SequenceStore, SequenceStoreError,
};
pub use serial_store::{InMemorySerialStore, SerialRecordStore, SerialStoreError, StatusCounts};

#[cfg(feature = "postgres")]
pub use registry::PostgresSupplierRegistry;
#[cfg(feature = "postgres")]
pub use sequence_store::PostgresSequenceStore;
#[cfg(feature = "postgres")]
pub use serial_store::PostgresSerialStore;
