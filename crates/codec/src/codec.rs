//! Encode/decode between [`CodeFields`] and the two fixed-width layouts.

use serde::{Deserialize, Serialize};

use serialforge_core::CodeLayout;

use crate::error::CodecError;
use crate::segment::{BrandPrefix, ChannelCode, IssueDate, ModelCode, Month, SerialNumber, SupplierCode};

/// Both layouts render to exactly this many characters.
pub const CODE_LEN: usize = 16;

/// Number of years the 2-character finished-goods year counter can express.
const FG_YEAR_SPAN: i32 = 26 * 26;

/// Number of years before the 1-character spare-part year code wraps.
const SP_YEAR_WINDOW: i32 = 26;

/// Deployment constants for the codec.
///
/// The brand prefix and the base year are fixed per deployment; everything
/// else a code carries arrives as explicit input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub brand_prefix: BrandPrefix,
    pub base_year: i32,
}

impl CodecConfig {
    pub fn new(brand_prefix: BrandPrefix, base_year: i32) -> Self {
        Self {
            brand_prefix,
            base_year,
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            brand_prefix: BrandPrefix::new("AP").unwrap_or_else(|_| unreachable!()),
            base_year: 2026,
        }
    }
}

/// Decomposed description of one serial code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum CodeFields {
    FinishedGood {
        brand: BrandPrefix,
        date: IssueDate,
        model: ModelCode,
        serial: SerialNumber,
    },
    SparePart {
        brand: BrandPrefix,
        supplier: SupplierCode,
        date: IssueDate,
        channel: ChannelCode,
        serial: SerialNumber,
    },
}

impl CodeFields {
    pub fn layout(&self) -> CodeLayout {
        match self {
            CodeFields::FinishedGood { .. } => CodeLayout::FinishedGoods,
            CodeFields::SparePart { .. } => CodeLayout::SparePart,
        }
    }

    pub fn serial(&self) -> SerialNumber {
        match self {
            CodeFields::FinishedGood { serial, .. } => *serial,
            CodeFields::SparePart { serial, .. } => *serial,
        }
    }

    pub fn brand(&self) -> &BrandPrefix {
        match self {
            CodeFields::FinishedGood { brand, .. } => brand,
            CodeFields::SparePart { brand, .. } => brand,
        }
    }
}

/// Render a decomposed description into its 16-character code.
pub fn encode(config: &CodecConfig, fields: &CodeFields) -> Result<String, CodecError> {
    if fields.brand() != &config.brand_prefix {
        return Err(CodecError::invalid_field(format!(
            "brand prefix '{}' does not match deployment prefix '{}'",
            fields.brand(),
            config.brand_prefix
        )));
    }

    let mut out = String::with_capacity(CODE_LEN);
    match fields {
        CodeFields::FinishedGood {
            brand,
            date,
            model,
            serial,
        } => {
            let [y0, y1] = fg_year_code(config, date.year)?;
            out.push_str(brand.as_str());
            out.push(y0);
            out.push(y1);
            out.push(date.month.to_code_char());
            out.push_str(model.as_str());
            out.push_str(&serial.to_padded());
        }
        CodeFields::SparePart {
            brand,
            supplier,
            date,
            channel,
            serial,
        } => {
            out.push_str(brand.as_str());
            out.push_str(supplier.as_str());
            out.push(sp_year_code(config, date.year));
            out.push(date.month.to_code_char());
            out.push_str(channel.as_str());
            out.push_str(&serial.to_padded());
        }
    }

    debug_assert_eq!(out.len(), CODE_LEN);
    Ok(out)
}

/// Parse a bare 16-character code of unknown item type.
///
/// The two layouts form a fixed catalog of parse attempts: finished goods
/// first, then spare part. Both layouts are eight letters followed by eight
/// digits, so a code can satisfy both grammars; the authoritative
/// disambiguation of a scanned code is the record store lookup, not the
/// codec.
pub fn decode(config: &CodecConfig, code: &str) -> Result<CodeFields, CodecError> {
    let code = code.trim().to_ascii_uppercase();
    if !code.is_ascii() || code.len() != CODE_LEN {
        return Err(CodecError::malformed(format!(
            "expected {CODE_LEN} ascii characters, got {} ('{code}')",
            code.len()
        )));
    }

    if code[0..2] != *config.brand_prefix.as_str() {
        return Err(CodecError::UnknownBrandPrefix(code[0..2].to_string()));
    }

    if let Ok(fields) = decode_finished_goods(config, &code) {
        return Ok(fields);
    }
    decode_spare_part(config, &code)
        .map_err(|_| CodecError::malformed(format!("'{code}' matches neither known layout")))
}

/// `[brand:2][year:2][month:1][model:3][serial:8]`
fn decode_finished_goods(config: &CodecConfig, code: &str) -> Result<CodeFields, CodecError> {
    let brand = BrandPrefix::new(&code[0..2])?;
    let year = fg_year_decode(config, &code[2..4])?;
    let month = Month::from_code_char(char_at(code, 4))?;
    let model = ModelCode::new(&code[5..8])?;
    let serial = parse_serial(&code[8..16])?;
    Ok(CodeFields::FinishedGood {
        brand,
        date: IssueDate { year, month },
        model,
        serial,
    })
}

/// `[brand:2][supplier:2][year:1][month:1][channel:2][serial:8]`
fn decode_spare_part(config: &CodecConfig, code: &str) -> Result<CodeFields, CodecError> {
    let brand = BrandPrefix::new(&code[0..2])?;
    let supplier = SupplierCode::new(&code[2..4])?;
    let year = sp_year_decode(config, char_at(code, 4))?;
    let month = Month::from_code_char(char_at(code, 5))?;
    let channel = ChannelCode::new(&code[6..8])?;
    let serial = parse_serial(&code[8..16])?;
    Ok(CodeFields::SparePart {
        brand,
        supplier,
        date: IssueDate { year, month },
        channel,
        serial,
    })
}

fn char_at(code: &str, index: usize) -> char {
    // Callers have verified the code is ASCII and CODE_LEN long.
    code.as_bytes()[index] as char
}

fn parse_serial(segment: &str) -> Result<SerialNumber, CodecError> {
    if !segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(CodecError::invalid_field(format!(
            "serial segment must be 8 digits, got '{segment}'"
        )));
    }
    let value: u64 = segment
        .parse()
        .map_err(|e| CodecError::invalid_field(format!("serial segment '{segment}': {e}")))?;
    SerialNumber::new(value)
}

/// Two-character base-26 year counter for finished goods.
///
/// Digits are `A`=0..`Z`=25 over `year - base_year`, so the counter covers
/// 676 years from the deployment's base year before exhausting the field.
fn fg_year_code(config: &CodecConfig, year: i32) -> Result<[char; 2], CodecError> {
    let offset = year - config.base_year;
    if !(0..FG_YEAR_SPAN).contains(&offset) {
        return Err(CodecError::invalid_field(format!(
            "year {year} outside encodable range {}..{}",
            config.base_year,
            config.base_year + FG_YEAR_SPAN - 1
        )));
    }
    Ok([
        (b'A' + (offset / 26) as u8) as char,
        (b'A' + (offset % 26) as u8) as char,
    ])
}

fn fg_year_decode(config: &CodecConfig, segment: &str) -> Result<i32, CodecError> {
    let digits: Vec<i32> = segment
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                Ok(c as i32 - 'A' as i32)
            } else {
                Err(CodecError::invalid_field(format!(
                    "year segment must be letters, got '{segment}'"
                )))
            }
        })
        .collect::<Result<_, _>>()?;
    Ok(config.base_year + digits[0] * 26 + digits[1])
}

/// Single-character year code for spare parts.
///
/// Wraps modulo 26: years 26 apart produce identical codes. The record
/// store, not the code, is the durable source of a unit's issue year.
fn sp_year_code(config: &CodecConfig, year: i32) -> char {
    let offset = (year - config.base_year).rem_euclid(SP_YEAR_WINDOW);
    (b'A' + offset as u8) as char
}

/// Inverse of [`sp_year_code`] up to the 26-year window: returns the earliest
/// year in the window that produces this code.
fn sp_year_decode(config: &CodecConfig, c: char) -> Result<i32, CodecError> {
    if !c.is_ascii_uppercase() {
        return Err(CodecError::invalid_field(format!(
            "year character must be A..Z, got '{c}'"
        )));
    }
    Ok(config.base_year + (c as i32 - 'A' as i32))
}
