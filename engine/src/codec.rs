//! Row codec: sheet rows to boxes and back.
//!
//! The inventory sheet has a fixed 20-column layout (A–T). Reads arrive
//! as formatted strings; all typing happens here. Rows that lack a brand,
//! a name or a positive capacity are headers, separators or subtotals and
//! are skipped with a [`SkipReason`] rather than reported as errors.

use crate::{money, split::unpack, LotInfo, LotRow, RowIndex, SheetDate, Status, Unit};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

/// Number of columns in an inventory row.
pub const COLUMN_COUNT: usize = 20;

/// Location used for rows that leave the column blank.
pub const DEFAULT_LOCATION: &str = "Home";

/// Inventory sheet columns, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    AcquiredOn,
    Identity,
    Received,
    Brand,
    Name,
    Quantity,
    Capacity,
    Currency,
    UnitCost,
    CostPerUnit,
    Status,
    ReleasedOn,
    FactoryCode,
    Location,
    Consumed,
    Remaining,
    RingGauge,
    Length,
    Description,
    Notes,
}

impl Column {
    /// Zero-based position in the row.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Sheet column letter.
    pub fn letter(self) -> String {
        column_letter(self.index())
    }
}

/// Column letter for a zero-based column index: 0 → `A`, 26 → `AA`.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A value written to one cell.
///
/// Numbers go out as JSON numbers; everything else as text that the
/// sheet is free to interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(i64),
    Text(String),
}

impl Cell {
    /// Text the sheet must store verbatim.
    ///
    /// Text that reads as a number but not in its canonical form, such as
    /// `13.10` or `007`, gets a leading apostrophe so the sheet does not
    /// turn it into `13.1` or `7`.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        match Decimal::from_str(trimmed) {
            Ok(n) if n.normalize().to_string() != trimmed => Cell::Text(format!("'{}", text)),
            _ => Cell::Text(text),
        }
    }

    /// Cell text as it would read back from the sheet.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.strip_prefix('\'').unwrap_or(s).to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(i64::from(value))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Text(if value { "TRUE" } else { "FALSE" }.to_string())
    }
}

/// Why a row was left out of the decoded collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Too few cells to hold brand, name and capacity.
    Structural,
    BlankBrand,
    BlankName,
    /// Capacity missing, non-numeric or zero.
    InvalidCapacity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::Structural => "structural row",
            SkipReason::BlankBrand => "blank brand",
            SkipReason::BlankName => "blank name",
            SkipReason::InvalidCapacity => "invalid capacity",
        };
        f.write_str(text)
    }
}

/// A row that passed validation, with its capacity already parsed.
#[derive(Debug, Clone, Copy)]
pub struct ValidRow<'r> {
    cells: &'r [String],
    capacity: u32,
}

impl<'r> ValidRow<'r> {
    fn cell(&self, column: Column) -> &'r str {
        cell(self.cells, column)
    }

    fn count(&self, column: Column) -> Option<u32> {
        parse_count(self.cell(column))
    }
}

/// Outcome of decoding a whole range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub units: Vec<Unit>,
    /// Skipped rows as `(1-based row, reason)`.
    pub skipped: Vec<(RowIndex, SkipReason)>,
}

/// Converts between inventory rows and boxes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCodec {
    default_location: String,
}

impl Default for RowCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION)
    }
}

impl RowCodec {
    pub fn new(default_location: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
        }
    }

    pub fn default_location(&self) -> &str {
        &self.default_location
    }

    /// Lot input as a decode of its encoded row would read it back.
    pub fn normalize_lot(&self, lot: LotInfo) -> LotInfo {
        let mut lot = lot.normalized();
        if lot.location.is_empty() {
            lot.location = self.default_location.clone();
        }
        lot
    }

    /// Check the required fields of a row.
    pub fn validate<'r>(&self, row: &'r [String]) -> Result<ValidRow<'r>, SkipReason> {
        if row.len() <= Column::Capacity.index() {
            return Err(SkipReason::Structural);
        }
        if cell(row, Column::Brand).is_empty() {
            return Err(SkipReason::BlankBrand);
        }
        if cell(row, Column::Name).is_empty() {
            return Err(SkipReason::BlankName);
        }
        match parse_count(cell(row, Column::Capacity)) {
            Some(capacity) if capacity > 0 => Ok(ValidRow {
                cells: row,
                capacity,
            }),
            _ => Err(SkipReason::InvalidCapacity),
        }
    }

    /// Read a row into a lot row without splitting it.
    pub fn decode_lot(&self, row: &[String]) -> Result<LotRow, SkipReason> {
        let valid = self.validate(row)?;

        let location = valid.cell(Column::Location);
        let unit_cost = money::parse_money(valid.cell(Column::UnitCost));

        let lot = LotInfo {
            acquired_on: SheetDate::parse(valid.cell(Column::AcquiredOn)),
            received: valid.cell(Column::Received).eq_ignore_ascii_case("true"),
            brand: valid.cell(Column::Brand).to_string(),
            name: valid.cell(Column::Name).to_string(),
            capacity: valid.capacity,
            currency: money::normalize_currency(valid.cell(Column::Currency)),
            unit_cost,
            status: Status::from_cell(valid.cell(Column::Status)),
            released_on: SheetDate::parse(valid.cell(Column::ReleasedOn)),
            factory_code: valid.cell(Column::FactoryCode).to_string(),
            location: if location.is_empty() {
                self.default_location.clone()
            } else {
                location.to_string()
            },
            ring_gauge: valid.cell(Column::RingGauge).to_string(),
            length: valid.cell(Column::Length).to_string(),
            description: valid.cell(Column::Description).to_string(),
            notes: valid.cell(Column::Notes).to_string(),
        };

        Ok(LotRow {
            identity: valid.cell(Column::Identity).to_string(),
            quantity: valid
                .count(Column::Quantity)
                .filter(|q| *q > 0)
                .unwrap_or(1),
            lot,
            consumed: valid.count(Column::Consumed).unwrap_or(0),
            remaining: valid.count(Column::Remaining).unwrap_or(0),
        })
    }

    /// Decode one row into its boxes. `row_index` is the 1-based sheet row,
    /// used to name boxes whose identity cell is blank.
    pub fn decode_row(&self, row: &[String], row_index: RowIndex) -> Result<Vec<Unit>, SkipReason> {
        let lot = self.decode_lot(row)?;
        Ok(unpack(&lot, &format!("row{}", row_index)))
    }

    /// Decode a range read from the top of the sheet (element 0 is row 1).
    ///
    /// Rows repeating an identity cell seen higher up get the next
    /// `row_occurrence`, so their boxes stay apart from the earlier row's.
    pub fn decode_all(&self, rows: &[Vec<String>]) -> Decoded {
        let mut decoded = Decoded::default();
        let mut seen: HashMap<String, u32> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let row_index = i as RowIndex + 1;
            match self.decode_row(row, row_index) {
                Ok(mut units) => {
                    let occurrence = match units.first() {
                        Some(unit) if unit.is_locatable() => {
                            let count = seen.entry(unit.row_key.clone()).or_insert(0);
                            *count += 1;
                            *count - 1
                        }
                        _ => 0,
                    };
                    for unit in &mut units {
                        unit.row_occurrence = occurrence;
                    }
                    decoded.units.extend(units);
                }
                Err(reason) => decoded.skipped.push((row_index, reason)),
            }
        }
        decoded
    }

    /// Encode a box stored in its own row.
    pub fn encode_unit(&self, unit: &Unit) -> Vec<Cell> {
        self.encode_lot(&LotRow::single(unit))
    }

    /// Encode a lot row into the fixed 20-cell layout.
    pub fn encode_lot(&self, row: &LotRow) -> Vec<Cell> {
        let lot = &row.lot;
        let money_cell = |amount: Option<_>| match amount {
            Some(amount) => Cell::Text(money::format_money(&lot.currency, amount)),
            None => Cell::Text(String::new()),
        };

        vec![
            Cell::Text(lot.acquired_on.to_sheet()),
            Cell::literal(row.identity.clone()),
            Cell::from(lot.received),
            Cell::Text(lot.brand.clone()),
            Cell::Text(lot.name.clone()),
            Cell::from(row.quantity),
            Cell::from(lot.capacity),
            Cell::Text(lot.currency.clone()),
            money_cell(lot.unit_cost),
            money_cell(lot.cost_per_unit()),
            Cell::Text(lot.status.as_str().to_string()),
            Cell::Text(lot.released_on.to_sheet()),
            Cell::Text(lot.factory_code.clone()),
            Cell::Text(lot.location.clone()),
            Cell::from(row.consumed),
            Cell::from(row.remaining),
            Cell::Text(lot.ring_gauge.clone()),
            Cell::Text(lot.length.clone()),
            Cell::Text(lot.description.clone()),
            Cell::Text(lot.notes.clone()),
        ]
    }
}

/// Trimmed cell text; missing trailing cells read as blank.
fn cell(row: &[String], column: Column) -> &str {
    row.get(column.index()).map(|s| s.trim()).unwrap_or("")
}

/// Parse a non-negative integer cell, tolerating `1,200` and `25.0`.
pub(crate) fn parse_count(cell: &str) -> Option<u32> {
    parse_integer(cell).and_then(|n| u32::try_from(n).ok())
}

/// Parse a possibly negative integer cell.
pub(crate) fn parse_integer(cell: &str) -> Option<i64> {
    let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }
    let float: f64 = cleaned.parse().ok()?;
    (float.is_finite() && float.fract() == 0.0).then_some(float as i64)
}

/// Read a row's identity cell; shared by the row locator.
pub(crate) fn identity_cell(row: &[String]) -> &str {
    cell(row, Column::Identity)
}

/// Read a row's first cell; shared by the insertion point resolver.
pub(crate) fn first_cell(row: &[String]) -> &str {
    row.first().map(String::as_str).unwrap_or("")
}
