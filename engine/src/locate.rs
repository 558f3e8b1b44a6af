//! Row locator: find the sheet row holding a key.
//!
//! Structural inserts and deletes shift every row below them, so a row
//! number is only good until the next write. [`RowPosition`] models that:
//! only the locator and the insertion point resolver can make one, it
//! cannot be cloned, and each write call consumes it. Callers locate
//! against a freshly read range immediately before the write.
//!
//! Ranges passed here are read from the top of the sheet, so element 0
//! of the slice is sheet row 1.

use crate::{codec, history::HistoryKey, RowIndex};

/// A 1-based sheet row, valid for exactly one write.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a located row must be handed to exactly one write"]
pub struct RowPosition {
    index: RowIndex,
}

impl RowPosition {
    pub(crate) fn new(index: RowIndex) -> Self {
        debug_assert!(index >= 1, "sheet rows are 1-based");
        Self { index }
    }

    fn from_offset(offset: usize) -> Self {
        Self::new(offset as RowIndex + 1)
    }

    /// 1-based sheet row (for A1 ranges).
    pub fn index(&self) -> RowIndex {
        self.index
    }

    /// 0-based row (for structural dimension requests).
    pub fn zero_based(&self) -> RowIndex {
        self.index - 1
    }
}

/// Find the row whose identity cell is `key` or lists `key`.
///
/// An exact match anywhere wins over a list membership match. A blank
/// key is never found.
pub fn locate_unit(rows: &[Vec<String>], key: &str) -> Option<RowPosition> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    rows.iter()
        .position(|row| codec::identity_cell(row) == key)
        .or_else(|| {
            rows.iter().position(|row| {
                codec::identity_cell(row)
                    .split(',')
                    .any(|part| part.trim() == key)
            })
        })
        .map(RowPosition::from_offset)
}

/// Find the `occurrence`-th row (from zero) whose identity cell is
/// exactly `key`. Occurrence zero is [`locate_unit`].
pub fn locate_unit_occurrence(
    rows: &[Vec<String>],
    key: &str,
    occurrence: u32,
) -> Option<RowPosition> {
    if occurrence == 0 {
        return locate_unit(rows, key);
    }
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    rows.iter()
        .enumerate()
        .filter(|(_, row)| codec::identity_cell(row) == key)
        .nth(occurrence as usize)
        .map(|(offset, _)| RowPosition::from_offset(offset))
}

/// Find the first history row matching the composite key.
///
/// History rows have no identity of their own; when several rows share
/// the key the first one is returned. See [`count_history_matches`].
pub fn locate_history(rows: &[Vec<String>], key: &HistoryKey) -> Option<RowPosition> {
    rows.iter()
        .position(|row| key.matches(row))
        .map(RowPosition::from_offset)
}

/// Number of history rows sharing the composite key.
pub fn count_history_matches(rows: &[Vec<String>], key: &HistoryKey) -> usize {
    rows.iter().filter(|row| key.matches(row)).count()
}
