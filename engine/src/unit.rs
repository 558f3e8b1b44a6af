//! Box and lot types.
//!
//! A [`Unit`] is one box with its own counters. Boxes bought together
//! share a [`LotInfo`], and the sheet may persist several of them as one
//! [`LotRow`].

use crate::{error::Result, money, Error, SheetDate, UnitId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a box stands in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    /// Resting in the humidor (the sheet's default).
    #[default]
    Ageing,
    /// Open and being smoked.
    Smoking,
    /// Set aside for someone else.
    Reserved,
    /// Empty.
    Finished,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Ageing,
        Status::Smoking,
        Status::Reserved,
        Status::Finished,
    ];

    /// Sheet label for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ageing => "Ageing",
            Status::Smoking => "Smoking",
            Status::Reserved => "Reserved",
            Status::Finished => "Finished",
        }
    }

    /// Parse a sheet label, falling back to the default for anything else.
    pub fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        Status::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(cell))
            .unwrap_or_default()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes shared by every box of one lot.
///
/// Missing fields deserialize to the sheet defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LotInfo {
    pub acquired_on: SheetDate,
    pub received: bool,
    pub brand: String,
    pub name: String,
    /// Cigars per box.
    pub capacity: u32,
    pub currency: String,
    /// Price paid for one box.
    pub unit_cost: Option<Decimal>,
    pub status: Status,
    pub released_on: SheetDate,
    pub factory_code: String,
    pub location: String,
    pub ring_gauge: String,
    pub length: String,
    pub description: String,
    pub notes: String,
}

impl LotInfo {
    /// Lot info with the required fields and sheet defaults for the rest.
    pub fn new(brand: impl Into<String>, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            acquired_on: SheetDate::Unknown,
            received: false,
            brand: brand.into(),
            name: name.into(),
            capacity,
            currency: money::DEFAULT_CURRENCY.to_string(),
            unit_cost: None,
            status: Status::default(),
            released_on: SheetDate::Unknown,
            factory_code: String::new(),
            location: String::new(),
            ring_gauge: String::new(),
            length: String::new(),
            description: String::new(),
            notes: String::new(),
        }
    }

    /// Price of one cigar, rounded to cents.
    pub fn cost_per_unit(&self) -> Option<Decimal> {
        let cost = self.unit_cost?;
        if self.capacity == 0 {
            return None;
        }
        Some((cost / Decimal::from(self.capacity)).round_dp(2))
    }

    /// The lot as a sheet row would read back: trimmed text, an upper-case
    /// currency code and a cost rounded to cents. A blank location is left
    /// for the codec to default.
    pub fn normalized(self) -> Self {
        let trim = |s: String| s.trim().to_string();
        Self {
            brand: trim(self.brand),
            name: trim(self.name),
            currency: money::normalize_currency(&self.currency),
            unit_cost: self.unit_cost.map(|cost| cost.round_dp(2)),
            factory_code: trim(self.factory_code),
            location: trim(self.location),
            ring_gauge: trim(self.ring_gauge),
            length: trim(self.length),
            description: trim(self.description),
            notes: trim(self.notes),
            ..self
        }
    }

    /// Check the fields a row needs to be decodable again.
    pub fn validate(&self) -> Result<()> {
        if self.brand.trim().is_empty() {
            return Err(Error::MissingRequiredField("brand"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::MissingRequiredField("name"));
        }
        if self.capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(())
    }
}

impl Default for LotInfo {
    fn default() -> Self {
        Self::new("", "", 0)
    }
}

/// One box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Stable identity, e.g. `"10"` or `"10.2"`.
    pub id: UnitId,
    /// Raw identity cell of the row this box is persisted in.
    ///
    /// Equal to `id` for a box with its own row; shared by all boxes of a
    /// multi-box lot row; empty when the row had no identity at all.
    pub row_key: String,
    /// Which of the rows sharing `row_key` holds this box, counted from
    /// the top of the sheet. Zero unless the identity cell is repeated.
    #[serde(default)]
    pub row_occurrence: u32,
    #[serde(flatten)]
    pub lot: LotInfo,
    pub consumed: u32,
    pub remaining: u32,
}

impl Unit {
    /// A full, unopened box persisted in its own row.
    pub fn new(id: impl Into<UnitId>, lot: LotInfo) -> Self {
        let id = id.into();
        Self {
            row_key: id.clone(),
            row_occurrence: 0,
            remaining: lot.capacity,
            consumed: 0,
            id,
            lot,
        }
    }

    /// Whether this box can be located in the sheet.
    pub fn is_locatable(&self) -> bool {
        !self.row_key.trim().is_empty()
    }

    /// Whether `other` is persisted in the same sheet row.
    pub fn shares_row_with(&self, other: &Unit) -> bool {
        self.is_locatable()
            && self.row_key == other.row_key
            && self.row_occurrence == other.row_occurrence
    }

    /// Move `count` cigars from remaining to consumed.
    pub fn consume(&mut self, count: u32) -> Result<()> {
        if count > self.remaining {
            return Err(Error::InsufficientRemaining {
                id: self.id.clone(),
                requested: count,
                remaining: self.remaining,
            });
        }
        self.remaining -= count;
        self.consumed += count;
        Ok(())
    }

    /// Set the remaining count; consumed becomes the rest of the capacity.
    pub fn set_remaining(&mut self, remaining: u32) -> Result<()> {
        if remaining > self.lot.capacity {
            return Err(Error::RemainingExceedsCapacity {
                remaining,
                capacity: self.lot.capacity,
            });
        }
        self.remaining = remaining;
        self.consumed = self.lot.capacity - remaining;
        Ok(())
    }
}

/// One persisted row, possibly standing for several boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotRow {
    /// Identity cell: one identity or a comma-separated list.
    pub identity: String,
    pub quantity: u32,
    #[serde(flatten)]
    pub lot: LotInfo,
    /// Sum of consumed over the lot's boxes.
    pub consumed: u32,
    /// Sum of remaining over the lot's boxes.
    pub remaining: u32,
}

impl LotRow {
    /// The row for a box stored on its own.
    pub fn single(unit: &Unit) -> Self {
        Self {
            identity: unit.id.clone(),
            quantity: 1,
            lot: unit.lot.clone(),
            consumed: unit.consumed,
            remaining: unit.remaining,
        }
    }
}

/// Partial edit of a box.
///
/// Lot-level fields apply to every box sharing the row; `remaining`
/// applies to the addressed box only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitPatch {
    pub acquired_on: Option<SheetDate>,
    pub received: Option<bool>,
    pub brand: Option<String>,
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub currency: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub status: Option<Status>,
    pub released_on: Option<SheetDate>,
    pub factory_code: Option<String>,
    pub location: Option<String>,
    pub ring_gauge: Option<String>,
    pub length: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub remaining: Option<u32>,
}

impl UnitPatch {
    /// Whether the patch touches any lot-level field.
    pub fn touches_lot(&self) -> bool {
        let counters_only = UnitPatch {
            remaining: self.remaining,
            ..UnitPatch::default()
        };
        *self != counters_only
    }

    /// Apply the lot-level fields to `lot`, returning the edited copy.
    pub fn apply_to_lot(&self, lot: &LotInfo) -> Result<LotInfo> {
        let mut lot = lot.clone();
        if let Some(v) = self.acquired_on {
            lot.acquired_on = v;
        }
        if let Some(v) = self.received {
            lot.received = v;
        }
        if let Some(v) = &self.brand {
            lot.brand = v.trim().to_string();
        }
        if let Some(v) = &self.name {
            lot.name = v.trim().to_string();
        }
        if let Some(v) = self.capacity {
            lot.capacity = v;
        }
        if let Some(v) = &self.currency {
            lot.currency = money::normalize_currency(v);
        }
        if let Some(v) = self.unit_cost {
            lot.unit_cost = Some(v);
        }
        if let Some(v) = self.status {
            lot.status = v;
        }
        if let Some(v) = self.released_on {
            lot.released_on = v;
        }
        if let Some(v) = &self.factory_code {
            lot.factory_code = v.clone();
        }
        if let Some(v) = &self.location {
            lot.location = v.clone();
        }
        if let Some(v) = &self.ring_gauge {
            lot.ring_gauge = v.clone();
        }
        if let Some(v) = &self.length {
            lot.length = v.clone();
        }
        if let Some(v) = &self.description {
            lot.description = v.clone();
        }
        if let Some(v) = &self.notes {
            lot.notes = v.clone();
        }
        let lot = lot.normalized();
        lot.validate()?;
        Ok(lot)
    }
}

/// New stock to add: `quantity` full boxes sharing `lot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLot {
    #[serde(flatten)]
    pub lot: LotInfo,
    pub quantity: u32,
}
