//! `serialforge-sequences`: per-(model, item-type) monotonic counters and
//! the pure arithmetic of contiguous range reservation.
//!
//! The storage layer wraps [`ProductSequence::reserve`] in its atomic unit of
//! work; the overflow check and the counter mutation live here so every
//! backend enforces the same rules.

pub mod sequence;

pub use sequence::{ProductSequence, SequenceError, SequenceKey, SerialRange, DEFAULT_MAX_SERIAL};
