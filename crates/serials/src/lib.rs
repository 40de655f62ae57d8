//! `serialforge-serials`: the per-unit serial record and its lifecycle
//! state machine.
//!
//! Records are created once in `Generated` and advance through defined
//! transitions only; cancellation is a terminal status, never a row removal.

pub mod record;
pub mod status;

pub use record::{NewSerial, SerialRecord, WarrantyPeriod};
pub use status::{LifecycleError, SerialStatus, Transition};
