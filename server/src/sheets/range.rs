//! Sheet references and A1 notation.

use humidor_engine::{codec::column_letter, RowIndex};

/// A tab of the spreadsheet: its title for A1 ranges and its numeric id
/// for structural requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub title: String,
    pub id: i64,
}

impl SheetRef {
    pub fn new(title: impl Into<String>, id: i64) -> Self {
        Self {
            title: title.into(),
            id,
        }
    }

    /// Title quoted for A1 notation (`'Box ''A'''`).
    fn quoted(&self) -> String {
        format!("'{}'", self.title.replace('\'', "''"))
    }

    /// Every row of the first `width` columns, starting at row 1.
    pub fn columns(&self, width: usize) -> String {
        let last = column_letter(width.saturating_sub(1));
        format!("{}!A:{}", self.quoted(), last)
    }

    /// One whole column.
    pub fn column(&self, column: usize) -> String {
        let letter = column_letter(column);
        format!("{}!{}:{}", self.quoted(), letter, letter)
    }

    /// The first `width` cells of one row.
    pub fn row(&self, row: RowIndex, width: usize) -> String {
        let last = column_letter(width.saturating_sub(1));
        format!("{}!A{}:{}{}", self.quoted(), row, last, row)
    }

    /// A single cell.
    pub fn cell(&self, column: usize, row: RowIndex) -> String {
        format!("{}!{}{}", self.quoted(), column_letter(column), row)
    }
}
