//! Codec error model.

use thiserror::Error;

/// Error returned by encode/decode operations.
///
/// All variants are deterministic and caller-correctable; the codec never
/// retries anything internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A segment does not fit its fixed width or contains characters outside
    /// its alphabet.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// The string does not conform to either known layout.
    #[error("malformed code: {0}")]
    MalformedCode(String),

    /// The leading two characters do not match the configured brand prefix.
    #[error("unknown brand prefix: {0}")]
    UnknownBrandPrefix(String),
}

impl CodecError {
    pub fn invalid_field(msg: impl Into<String>) -> Self {
        Self::InvalidField(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCode(msg.into())
    }
}
