//! Splitting lot rows into boxes and packing boxes back into rows.
//!
//! A lot row carries aggregate counters. Decoding hands every box the
//! floor of `aggregate / quantity`, and the first `aggregate % quantity`
//! boxes in identity order get one more. Remaining and consumed are
//! distributed independently. Sums are always exact.
//!
//! Identities come from the row's identity cell: its comma-separated
//! entries when there are exactly `quantity` of them, otherwise
//! `{cell}.1` .. `{cell}.{quantity}`.

use crate::{LotRow, Unit};

/// Per-box share of a lot row's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub id: String,
    pub remaining: u32,
    pub consumed: u32,
}

/// Divide `total` into `parts` shares that differ by at most one.
///
/// The extra units go to the leading shares. `parts == 0` yields nothing.
pub fn distribute(total: u32, parts: u32) -> Vec<u32> {
    if parts == 0 {
        return Vec::new();
    }
    let base = total / parts;
    let remainder = total % parts;
    (0..parts)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Identities of the boxes stored under one identity cell, in split order.
pub fn lot_identities(cell: &str, quantity: u32) -> Vec<String> {
    let cell = cell.trim();
    let quantity = quantity.max(1);
    if quantity == 1 {
        return vec![cell.to_string()];
    }

    let declared: Vec<String> = cell
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    if declared.len() == quantity as usize {
        return declared;
    }

    (1..=quantity).map(|n| format!("{}.{}", cell, n)).collect()
}

/// Split aggregate counters across the boxes of one identity cell.
pub fn split(cell: &str, quantity: u32, remaining: u32, consumed: u32) -> Vec<Share> {
    let quantity = quantity.max(1);
    let remaining = distribute(remaining, quantity);
    let consumed = distribute(consumed, quantity);

    lot_identities(cell, quantity)
        .into_iter()
        .zip(remaining)
        .zip(consumed)
        .map(|((id, remaining), consumed)| Share {
            id,
            remaining,
            consumed,
        })
        .collect()
}

/// Expand a lot row into its boxes.
///
/// `fallback` names the boxes when the identity cell is blank; those boxes
/// get an empty row key and cannot be located remotely.
pub fn unpack(row: &LotRow, fallback: &str) -> Vec<Unit> {
    let (cell, row_key) = if row.identity.trim().is_empty() {
        (fallback, "")
    } else {
        (row.identity.trim(), row.identity.trim())
    };

    split(cell, row.quantity, row.remaining, row.consumed)
        .into_iter()
        .map(|share| Unit {
            id: share.id,
            row_key: row_key.to_string(),
            row_occurrence: 0,
            lot: row.lot.clone(),
            consumed: share.consumed,
            remaining: share.remaining,
        })
        .collect()
}

/// Fold the boxes of one persisted row back into a lot row.
///
/// The identity cell stays `row_key` when splitting it again would give
/// exactly these identities; otherwise it lists them. Lot-level fields
/// come from the first member. Returns `None` for an empty member list.
pub fn pack(row_key: &str, members: &[&Unit]) -> Option<LotRow> {
    let first = members.first()?;
    let quantity = members.len() as u32;
    let ids: Vec<String> = members.iter().map(|u| u.id.clone()).collect();

    let identity = if lot_identities(row_key, quantity) == ids {
        row_key.trim().to_string()
    } else {
        ids.join(", ")
    };

    Some(LotRow {
        identity,
        quantity,
        lot: first.lot.clone(),
        consumed: members.iter().map(|u| u.consumed).sum(),
        remaining: members.iter().map(|u| u.remaining).sum(),
    })
}
