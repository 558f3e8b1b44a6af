//! History log rows.
//!
//! The history sheet is an append-only log with a fixed 6-column layout:
//! date, box (or [`EXTERNAL_REF`]), brand, name, quantity, notes. Entries
//! have no identity column; they are addressed by a composite key.

use crate::{codec, Cell, SheetDate};
use serde::{Deserialize, Serialize};

/// Number of columns in a history row.
pub const HISTORY_COLUMN_COUNT: usize = 6;

/// Box reference used for cigars that never were part of the collection.
pub const EXTERNAL_REF: &str = "External";

/// One logged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: SheetDate,
    /// Identity of the box, or [`EXTERNAL_REF`].
    pub box_ref: String,
    pub brand: String,
    pub name: String,
    /// Cigars involved; negative for corrections.
    pub quantity: i64,
    #[serde(default)]
    pub notes: String,
}

/// Fields that together stand in for a history row's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryKey {
    pub date: SheetDate,
    pub box_ref: String,
    pub brand: String,
    pub name: String,
    pub quantity: i64,
}

impl HistoryEntry {
    /// Whether the entry refers to a box outside the collection.
    pub fn is_external(&self) -> bool {
        self.box_ref.eq_ignore_ascii_case(EXTERNAL_REF)
    }

    pub fn key(&self) -> HistoryKey {
        HistoryKey {
            date: self.date,
            box_ref: self.box_ref.clone(),
            brand: self.brand.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
        }
    }

    /// Decode a history row. Headers and blank rows yield `None`.
    pub fn decode(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");

        let quantity = codec::parse_integer(cell(4))?;
        if cell(1).is_empty() && cell(2).is_empty() {
            return None;
        }

        Some(Self {
            date: SheetDate::parse(cell(0)),
            box_ref: cell(1).to_string(),
            brand: cell(2).to_string(),
            name: cell(3).to_string(),
            quantity,
            notes: cell(5).to_string(),
        })
    }

    /// Decode every history row in a range, skipping the rest.
    pub fn decode_all(rows: &[Vec<String>]) -> Vec<Self> {
        rows.iter().filter_map(|row| Self::decode(row)).collect()
    }

    pub fn encode(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.date.to_sheet()),
            Cell::literal(self.box_ref.clone()),
            Cell::Text(self.brand.clone()),
            Cell::Text(self.name.clone()),
            Cell::Number(self.quantity),
            Cell::Text(self.notes.clone()),
        ]
    }
}

impl HistoryKey {
    /// Compare against a raw history row, normalizing date and quantity.
    pub fn matches(&self, row: &[String]) -> bool {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");

        SheetDate::parse(cell(0)) == self.date
            && cell(1) == self.box_ref.trim()
            && cell(2) == self.brand.trim()
            && cell(3) == self.name.trim()
            && codec::parse_integer(cell(4)) == Some(self.quantity)
    }
}
