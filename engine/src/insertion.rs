//! Insertion point resolver.
//!
//! The inventory sheet ends with a summary row (`Subtotal ...`). New rows
//! go directly above the first such row so the summary keeps covering
//! them; without one they go after the last row read.

use crate::{codec, locate::RowPosition, RowIndex};

/// Sentinel text marking the summary row.
pub const DEFAULT_SENTINEL: &str = "Subtotal";

/// Position for a new row, given the values of one column read from row 1.
///
/// Returns the 1-based row of the first cell containing `sentinel`, which
/// is where the new row lands once the sentinel row is pushed down, or one
/// past the last row when no cell contains it.
pub fn insertion_point<S: AsRef<str>>(column: &[S], sentinel: &str) -> RowPosition {
    let found = if sentinel.is_empty() {
        None
    } else {
        column
            .iter()
            .position(|value| value.as_ref().contains(sentinel))
    };

    let offset = found.unwrap_or(column.len());
    RowPosition::new(offset as RowIndex + 1)
}

/// Same as [`insertion_point`] for a range whose first column is scanned.
pub fn insertion_point_in_rows(rows: &[Vec<String>], sentinel: &str) -> RowPosition {
    let column: Vec<&str> = rows.iter().map(|row| codec::first_cell(row)).collect();
    insertion_point(&column, sentinel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lands_on_sentinel_row() {
        let column = ["Header", "Row A", "Subtotal Spent", "Row B"];
        assert_eq!(insertion_point(&column, "Subtotal").index(), 3);
    }

    #[test]
    fn rows_after_sentinel_do_not_matter() {
        let column = ["Header", "Row A", "Subtotal Spent", "Subtotal again", "x", "y"];
        assert_eq!(insertion_point(&column, "Subtotal").index(), 3);
    }

    #[test]
    fn no_sentinel_appends_after_last_row() {
        let column = ["Header", "Row A", "Row B"];
        assert_eq!(insertion_point(&column, "Subtotal").index(), 4);

        let empty: [&str; 0] = [];
        assert_eq!(insertion_point(&empty, "Subtotal").index(), 1);
    }

    #[test]
    fn match_is_substring_and_case_sensitive() {
        let column = ["Header", "Grand subtotal", "Box Subtotal"];
        assert_eq!(insertion_point(&column, "Subtotal").index(), 3);
    }

    #[test]
    fn empty_sentinel_never_matches() {
        let column = ["Header", "Row A"];
        assert_eq!(insertion_point(&column, "").index(), 3);
    }

    #[test]
    fn scans_first_column_of_rows() {
        let rows = vec![
            vec!["Date".to_string(), "ID".to_string()],
            vec!["1 Jan 2024".to_string(), "1".to_string()],
            vec![],
            vec!["Subtotal".to_string()],
        ];
        let position = insertion_point_in_rows(&rows, DEFAULT_SENTINEL);
        assert_eq!(position.index(), 4);
        assert_eq!(position.zero_based(), 3);
    }
}
