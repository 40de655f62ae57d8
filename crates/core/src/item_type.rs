//! Item-type vocabulary shared by the codec, the sequence allocator and the
//! record store.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Kind of manufactured/sourced unit a serial code is issued for.
///
/// Sequences are keyed by (model_code, item_type), so a model's finished
/// goods, spare parts and components each draw from their own counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    FinishedGood,
    SparePart,
    Component,
}

/// Which of the two fixed-width barcode layouts an item type encodes with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodeLayout {
    /// `[brand:2][year:2][month:1][model:3][serial:8]`
    FinishedGoods,
    /// `[brand:2][supplier:2][year:1][month:1][channel:2][serial:8]`
    SparePart,
}

impl ItemType {
    /// Components carry the channel-coded spare-part layout; only finished
    /// goods carry the model code in the barcode itself.
    pub fn code_layout(self) -> CodeLayout {
        match self {
            ItemType::FinishedGood => CodeLayout::FinishedGoods,
            ItemType::SparePart | ItemType::Component => CodeLayout::SparePart,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::FinishedGood => "finished_good",
            ItemType::SparePart => "spare_part",
            ItemType::Component => "component",
        }
    }
}

impl core::fmt::Display for ItemType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished_good" => Ok(ItemType::FinishedGood),
            "spare_part" => Ok(ItemType::SparePart),
            "component" => Ok(ItemType::Component),
            other => Err(DomainError::validation(format!(
                "unknown item type: {other}"
            ))),
        }
    }
}
