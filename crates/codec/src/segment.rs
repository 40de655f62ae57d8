//! Validated value types for every barcode segment.
//!
//! Each type enforces its fixed width and alphabet at construction and
//! canonicalizes to upper-case, so a constructed value always renders into
//! exactly its segment slot.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

macro_rules! impl_letter_code {
    ($t:ident, $width:literal, $name:literal) => {
        /// Fixed-width upper-case letter code (see module docs).
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(String);

        impl $t {
            /// Validate width and alphabet, canonicalizing to upper-case.
            pub fn new(value: impl AsRef<str>) -> Result<Self, CodecError> {
                let value = value.as_ref().trim();
                if value.len() != $width || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(CodecError::invalid_field(format!(
                        "{} must be exactly {} letters, got '{}'",
                        $name, $width, value
                    )));
                }
                Ok(Self(value.to_ascii_uppercase()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = CodecError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_letter_code!(BrandPrefix, 2, "brand prefix");
impl_letter_code!(ModelCode, 3, "model code");
impl_letter_code!(SupplierCode, 2, "supplier code");
impl_letter_code!(ChannelCode, 2, "channel code");

/// Calendar month, encoded as a single character `A`..`L`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Month(u8);

impl Month {
    pub fn new(month: u8) -> Result<Self, CodecError> {
        if !(1..=12).contains(&month) {
            return Err(CodecError::invalid_field(format!(
                "month must be 1..=12, got {month}"
            )));
        }
        Ok(Self(month))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn to_code_char(self) -> char {
        (b'A' + self.0 - 1) as char
    }

    pub fn from_code_char(c: char) -> Result<Self, CodecError> {
        if !('A'..='L').contains(&c) {
            return Err(CodecError::invalid_field(format!(
                "month character must be A..L, got '{c}'"
            )));
        }
        Ok(Self(c as u8 - b'A' + 1))
    }
}

/// Per-unit serial number, rendered as exactly 8 zero-padded decimal digits.
///
/// Valid range is `1..=99_999_999`; zero is reserved (sequences start at
/// `last_serial = 0`, the first issued number is 1).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerialNumber(u64);

impl SerialNumber {
    pub const MAX: u64 = 99_999_999;

    pub fn new(value: u64) -> Result<Self, CodecError> {
        if value == 0 || value > Self::MAX {
            return Err(CodecError::invalid_field(format!(
                "serial number must be 1..={}, got {value}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Render the fixed-width serial segment.
    pub fn to_padded(self) -> String {
        format!("{:08}", self.0)
    }
}

impl core::fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// Explicit "as of" date context for encoding.
///
/// Callers supply this instead of the codec reading ambient time, keeping
/// encode pure and testable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueDate {
    pub year: i32,
    pub month: Month,
}

impl IssueDate {
    pub fn new(year: i32, month: u8) -> Result<Self, CodecError> {
        Ok(Self {
            year,
            month: Month::new(month)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_codes_canonicalize_to_upper_case() {
        assert_eq!(ModelCode::new("iel").unwrap().as_str(), "IEL");
        assert_eq!(SupplierCode::new("tn").unwrap().as_str(), "TN");
    }

    #[test]
    fn letter_codes_reject_wrong_width() {
        assert!(ModelCode::new("IELX").is_err());
        assert!(ModelCode::new("IE").is_err());
        assert!(BrandPrefix::new("A").is_err());
    }

    #[test]
    fn letter_codes_reject_non_letters() {
        assert!(ModelCode::new("IE1").is_err());
        assert!(ChannelCode::new("K-").is_err());
    }

    #[test]
    fn month_maps_january_to_a_and_december_to_l() {
        assert_eq!(Month::new(1).unwrap().to_code_char(), 'A');
        assert_eq!(Month::new(12).unwrap().to_code_char(), 'L');
        assert_eq!(Month::from_code_char('C').unwrap().number(), 3);
        assert!(Month::from_code_char('M').is_err());
        assert!(Month::new(0).is_err());
        assert!(Month::new(13).is_err());
    }

    #[test]
    fn serial_number_is_zero_padded_to_eight_digits() {
        assert_eq!(SerialNumber::new(1).unwrap().to_padded(), "00000001");
        assert_eq!(SerialNumber::new(99_999_999).unwrap().to_padded(), "99999999");
    }

    #[test]
    fn serial_number_rejects_zero_and_overflow() {
        assert!(SerialNumber::new(0).is_err());
        assert!(SerialNumber::new(100_000_000).is_err());
    }
}
