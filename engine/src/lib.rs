//! # Humidor Engine
//!
//! Pure logic for keeping a box inventory in sync with a remote sheet.
//!
//! The sheet is the source of truth, but it stores boxes in a denormalized
//! way: one row may stand for several boxes bought together. This crate
//! turns rows into boxes and boxes back into rows, and works out which
//! row a write has to touch. It performs no I/O.
//!
//! ## Design Principles
//!
//! - **No IO**: the HTTP client and the server live elsewhere
//! - **Deterministic**: the same range always decodes to the same boxes
//! - **Explicit skips**: rows that are not boxes are reported, not raised
//!
//! ## Core Concepts
//!
//! ### Boxes and lot rows
//!
//! A [`Unit`] is one box with its own `consumed` / `remaining` counters.
//! A [`LotRow`] is what the sheet persists: shared [`LotInfo`], a quantity
//! and aggregate counters.
//!
//! ### Row codec
//!
//! [`RowCodec`] validates a row (`validate -> Result<ValidRow, SkipReason>`),
//! decodes it and encodes boxes into the fixed 20-column layout.
//!
//! ### Splitting
//!
//! [`split`], [`unpack`] and [`pack`] convert between a lot row and its
//! boxes. Extras from an uneven split go to the leading boxes.
//!
//! ### Row positions
//!
//! [`locate_unit`], [`locate_history`] and [`insertion_point`] produce a
//! [`RowPosition`]. It cannot be cloned or built elsewhere, and each write
//! consumes one, so a row number never outlives the read it came from.
//!
//! ### Local state
//!
//! [`Inventory`] holds the boxes and applies mutations optimistically;
//! [`SyncSignal`] tracks the coarse sync status.
//!
//! ## Quick Start
//!
//! ```rust
//! use humidor_engine::{locate_unit, RowCodec};
//!
//! let row: Vec<String> = [
//!     "5 Jan 2024", "11", "TRUE", "Partagas", "Serie D No. 4", "3", "25",
//!     "USD", "$250.00", "$10.00", "Smoking", "", "", "", "7", "68",
//! ]
//! .iter()
//! .map(|c| c.to_string())
//! .collect();
//!
//! let codec = RowCodec::default();
//! let units = codec.decode_row(&row, 2).unwrap();
//!
//! let ids: Vec<&str> = units.iter().map(|u| u.id.as_str()).collect();
//! assert_eq!(ids, ["11.1", "11.2", "11.3"]);
//! assert_eq!(units[0].remaining, 23);
//!
//! let rows = vec![vec!["Date".to_string(), "ID".to_string()], row];
//! let position = locate_unit(&rows, &units[0].row_key).unwrap();
//! assert_eq!(position.index(), 2);
//! ```

pub mod codec;
pub mod date;
pub mod error;
pub mod history;
pub mod insertion;
pub mod locate;
pub mod money;
pub mod split;
pub mod status;
pub mod store;
pub mod unit;

// Re-export main types at crate root
pub use codec::{Cell, Column, Decoded, RowCodec, SkipReason, ValidRow, COLUMN_COUNT};
pub use date::SheetDate;
pub use error::Error;
pub use history::{HistoryEntry, HistoryKey, EXTERNAL_REF, HISTORY_COLUMN_COUNT};
pub use insertion::{insertion_point, insertion_point_in_rows, DEFAULT_SENTINEL};
pub use locate::{
    count_history_matches, locate_history, locate_unit, locate_unit_occurrence, RowPosition,
};
pub use split::{distribute, lot_identities, pack, split, unpack, Share};
pub use status::{SyncActivity, SyncSignal, SyncStatus, Transition};
pub use store::{Inventory, Query};
pub use unit::{LotInfo, LotRow, NewLot, Status, Unit, UnitPatch};

/// Type aliases for clarity
pub type UnitId = String;
pub type RowIndex = u32;
