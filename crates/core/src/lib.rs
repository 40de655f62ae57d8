//! `serialforge-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod item_type;

pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, DocumentId, OrderId, StockId, VendorId};
pub use item_type::{CodeLayout, ItemType};
