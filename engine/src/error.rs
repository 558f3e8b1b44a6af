//! Error types for the Humidor engine.

use crate::UnitId;
use thiserror::Error;

/// All possible errors from the Humidor engine.
///
/// Rows that fail to decode are not errors; see [`crate::SkipReason`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Lookup errors
    #[error("box not found: {0}")]
    UnitNotFound(UnitId),

    #[error("box already exists: {0}")]
    DuplicateIdentity(UnitId),

    // Counter errors
    #[error("cannot consume {requested} from box {id}: only {remaining} remaining")]
    InsufficientRemaining {
        id: UnitId,
        requested: u32,
        remaining: u32,
    },

    #[error("remaining count {remaining} exceeds capacity {capacity}")]
    RemainingExceedsCapacity { remaining: u32, capacity: u32 },

    // Validation errors
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("capacity must be greater than zero")]
    InvalidCapacity,

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
