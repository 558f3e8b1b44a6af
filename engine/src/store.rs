//! Inventory - the in-memory box collection.
//!
//! Mutations apply here first and are persisted afterwards; a refresh
//! replaces the whole collection with a fresh decode. Boxes keep the
//! order they were decoded or added in, which is also their sheet order.

use crate::{error::Result, Error, NewLot, Status, Unit, UnitPatch};
use serde::{Deserialize, Serialize};

/// The box collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    units: Vec<Unit>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units(units: Vec<Unit>) -> Self {
        Self { units }
    }

    /// Replace every box with a freshly decoded collection.
    pub fn replace_all(&mut self, units: Vec<Unit>) {
        self.units = units;
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Get a box by identity.
    pub fn get(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Unit> {
        self.units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::UnitNotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Start a filtered query over the boxes.
    pub fn query(&self) -> Query<'_> {
        Query::new(&self.units)
    }

    /// Boxes persisted in the row keyed `row_key`, in split order.
    ///
    /// `occurrence` picks the row when the key is repeated in the sheet.
    /// Boxes without a row key have no siblings; an empty key matches nothing.
    pub fn lot_members(&self, row_key: &str, occurrence: u32) -> Vec<&Unit> {
        if row_key.trim().is_empty() {
            return Vec::new();
        }
        self.units
            .iter()
            .filter(|u| u.row_key == row_key && u.row_occurrence == occurrence)
            .collect()
    }

    /// Next free integer base identity: one past the largest integer prefix.
    pub fn next_identity(&self) -> u64 {
        self.units
            .iter()
            .filter_map(|u| u.id.split('.').next()?.trim().parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Add a single box.
    pub fn add(&mut self, unit: Unit) -> Result<()> {
        if self.get(&unit.id).is_some() {
            return Err(Error::DuplicateIdentity(unit.id));
        }
        self.units.push(unit);
        Ok(())
    }

    /// Add `quantity` full boxes of one lot under a fresh base identity.
    ///
    /// One box gets `"{n}"`; several get `"{n}.1"` .. `"{n}.{quantity}"`.
    /// Each box owns its row.
    pub fn add_lot(&mut self, new_lot: NewLot) -> Result<Vec<Unit>> {
        if new_lot.quantity == 0 {
            return Err(Error::InvalidQuantity(new_lot.quantity));
        }
        let lot = new_lot.lot.normalized();
        lot.validate()?;

        let base = self.next_identity();
        let units: Vec<Unit> = if new_lot.quantity == 1 {
            vec![Unit::new(base.to_string(), lot)]
        } else {
            (1..=new_lot.quantity)
                .map(|i| Unit::new(format!("{}.{}", base, i), lot.clone()))
                .collect()
        };

        self.units.extend(units.iter().cloned());
        Ok(units)
    }

    /// Apply a patch to a box.
    ///
    /// Lot-level fields are applied to every box sharing its row; a new
    /// `remaining` only to the addressed box. Nothing changes on error.
    pub fn patch(&mut self, id: &str, patch: &UnitPatch) -> Result<Unit> {
        let index = self
            .units
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| Error::UnitNotFound(id.to_string()))?;
        let target = self.units[index].clone();
        let lot = patch.apply_to_lot(&target.lot)?;
        let capacity_changed = lot.capacity != target.lot.capacity;

        let in_lot = |i: usize, unit: &Unit| i == index || unit.shares_row_with(&target);

        for (i, unit) in self.units.iter().enumerate() {
            if !in_lot(i, unit) {
                continue;
            }
            let remaining = match patch.remaining {
                Some(remaining) if i == index => remaining,
                _ => unit.remaining,
            };
            if remaining > lot.capacity {
                return Err(Error::RemainingExceedsCapacity {
                    remaining,
                    capacity: lot.capacity,
                });
            }
        }

        for (i, unit) in self.units.iter_mut().enumerate() {
            if !in_lot(i, &*unit) {
                continue;
            }
            unit.lot = lot.clone();
            match patch.remaining {
                Some(remaining) if i == index => unit.set_remaining(remaining)?,
                _ if capacity_changed => unit.consumed = lot.capacity - unit.remaining,
                _ => {}
            }
        }

        Ok(self.units[index].clone())
    }

    /// Consume `count` cigars from a box.
    pub fn consume(&mut self, id: &str, count: u32) -> Result<Unit> {
        let unit = self.get_mut(id)?;
        unit.consume(count)?;
        Ok(unit.clone())
    }

    /// Set the received flag on a box and the rest of its lot.
    pub fn set_received(&mut self, id: &str, received: bool) -> Result<Unit> {
        self.patch(
            id,
            &UnitPatch {
                received: Some(received),
                ..UnitPatch::default()
            },
        )
    }

    /// Remove a box.
    ///
    /// When it was the last box of its row, that row is gone from the
    /// sheet and later rows repeating its key move up one occurrence.
    pub fn remove(&mut self, id: &str) -> Result<Unit> {
        let index = self
            .units
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| Error::UnitNotFound(id.to_string()))?;
        let unit = self.units.remove(index);
        if !self.units.iter().any(|u| u.shares_row_with(&unit)) {
            self.vacate(&unit.row_key, unit.row_occurrence);
        }
        Ok(unit)
    }

    /// Point every box persisted in row (`old`, `occurrence`) at the row
    /// now keyed `new`.
    pub fn rekey(&mut self, old: &str, occurrence: u32, new: &str) {
        if old.trim().is_empty() || old == new {
            return;
        }
        let moved = self
            .units
            .iter()
            .filter(|u| u.row_key == old && u.row_occurrence == occurrence)
            .count();
        if moved == 0 {
            return;
        }
        let taken = self
            .units
            .iter()
            .filter(|u| u.row_key == new)
            .map(|u| u.row_occurrence + 1)
            .max()
            .unwrap_or(0);
        for unit in self
            .units
            .iter_mut()
            .filter(|u| u.row_key == old && u.row_occurrence == occurrence)
        {
            unit.row_key = new.to_string();
            unit.row_occurrence = taken;
        }
        self.vacate(old, occurrence);
    }

    /// Close the gap left when row (`row_key`, `occurrence`) stops
    /// carrying that key.
    fn vacate(&mut self, row_key: &str, occurrence: u32) {
        for unit in self
            .units
            .iter_mut()
            .filter(|u| u.row_key == row_key && u.row_occurrence > occurrence)
        {
            unit.row_occurrence -= 1;
        }
    }
}

/// Builder for filtering boxes.
pub struct Query<'a> {
    units: &'a [Unit],
    brand: Option<String>,
    status: Option<Status>,
    location: Option<String>,
    in_stock: bool,
}

impl<'a> Query<'a> {
    fn new(units: &'a [Unit]) -> Self {
        Self {
            units,
            brand: None,
            status: None,
            location: None,
            in_stock: false,
        }
    }

    /// Only boxes of this brand (case-insensitive).
    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Only boxes kept at this location (case-insensitive).
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Only boxes with cigars left.
    pub fn in_stock(mut self) -> Self {
        self.in_stock = true;
        self
    }

    fn accepts(&self, unit: &Unit) -> bool {
        let same = |a: &str, b: &Option<String>| {
            b.as_deref()
                .map_or(true, |b| a.trim().eq_ignore_ascii_case(b.trim()))
        };
        same(&unit.lot.brand, &self.brand)
            && same(&unit.lot.location, &self.location)
            && self.status.map_or(true, |s| unit.lot.status == s)
            && (!self.in_stock || unit.remaining > 0)
    }

    /// Get all matching boxes.
    pub fn all(self) -> Vec<&'a Unit> {
        let units = self.units;
        units.iter().filter(|u| self.accepts(u)).collect()
    }

    pub fn count(self) -> usize {
        self.units.iter().filter(|u| self.accepts(u)).count()
    }
}
