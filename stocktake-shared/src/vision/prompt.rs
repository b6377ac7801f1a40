//! Scan prompts per inventory kind

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of inventory being counted; selects the scan prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryKind {
    #[default]
    Retail,
    Restaurant,
    Hospitality,
}

const RESPONSE_FORMAT: &str = "Respond with only a JSON array, no prose. Each element must be an \
object with \"label\" (short lowercase item name), \"count\" (integer number of units visible) \
and \"confidence\" (number between 0 and 1). If nothing is visible, respond with [].";

impl InventoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryKind::Retail => "retail",
            InventoryKind::Restaurant => "restaurant",
            InventoryKind::Hospitality => "hospitality",
        }
    }

    fn focus(&self) -> &'static str {
        match self {
            InventoryKind::Retail => {
                "You count stock on retail shelves and racks. Identify each distinct product \
                 (group sizes and colours of the same product together) and count the units."
            }
            InventoryKind::Restaurant => {
                "You count stock in a restaurant kitchen, pantry or walk-in. Identify each \
                 ingredient or packaged supply and count containers, bottles, cans or whole items."
            }
            InventoryKind::Hospitality => {
                "You count hotel and bar stock such as linens, toiletries, minibar items and \
                 bottles. Identify each distinct item and count the units."
            }
        }
    }

    /// Full instruction sent alongside the image
    pub fn prompt(&self) -> String {
        format!("{} {}", self.focus(), RESPONSE_FORMAT)
    }
}

impl fmt::Display for InventoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
