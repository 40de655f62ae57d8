//! `serialforge-codec`: deterministic, information-preserving encode/decode
//! between a decomposed serial description and a fixed-width barcode string.
//!
//! Two 16-character layouts exist, selected by item type when encoding and
//! tried as a fixed catalog when decoding a bare string:
//!
//! - Finished goods: `[brand:2][year:2][month:1][model:3][serial:8]`
//! - Spare part:     `[brand:2][supplier:2][year:1][month:1][channel:2][serial:8]`
//!
//! The codec is pure: the issue date is an explicit input, never read from
//! the wall clock.

pub mod codec;
pub mod error;
pub mod segment;

pub use codec::{decode, encode, CodeFields, CodecConfig, CODE_LEN};
pub use error::CodecError;
pub use segment::{
    BrandPrefix, ChannelCode, IssueDate, ModelCode, Month, SerialNumber, SupplierCode,
};
