//! Sync status signal.
//!
//! One coarse indicator for the whole sync layer:
//!
//! ```text
//! idle -> syncing -> success | error -> idle   (refresh)
//! idle -> writing -> success | error -> idle   (mutation)
//! ```
//!
//! Transitions are last-write-wins. Every transition bumps a generation
//! counter; settling back to idle only happens if nothing else moved the
//! signal since the outcome was recorded, so a stale timer cannot hide a
//! newer write.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    /// Full refresh in flight.
    Syncing,
    /// Single mutation in flight.
    Writing,
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Writing => "writing",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }

    /// Whether a round trip is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, SyncStatus::Syncing | SyncStatus::Writing)
    }

    /// Whether this is an outcome waiting to settle.
    pub fn is_outcome(&self) -> bool {
        matches!(self, SyncStatus::Success | SyncStatus::Error)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of round trip is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncActivity {
    Refresh,
    Write,
}

/// A status change, tagged with the generation it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub status: SyncStatus,
    pub generation: u64,
}

/// The state machine behind the signal.
#[derive(Debug, Clone, Default)]
pub struct SyncSignal {
    status: SyncStatus,
    generation: u64,
}

impl SyncSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_busy(&self) -> bool {
        self.status.is_busy()
    }

    /// Enter `syncing` or `writing`, whatever the current state.
    pub fn begin(&mut self, activity: SyncActivity) -> Transition {
        let status = match activity {
            SyncActivity::Refresh => SyncStatus::Syncing,
            SyncActivity::Write => SyncStatus::Writing,
        };
        self.set(status)
    }

    /// Record the outcome of the round trip that last began.
    pub fn finish(&mut self, ok: bool) -> Transition {
        self.set(if ok {
            SyncStatus::Success
        } else {
            SyncStatus::Error
        })
    }

    /// Return to idle if the signal is still at `generation` and showing
    /// an outcome. Returns the transition when it happened.
    pub fn settle(&mut self, generation: u64) -> Option<Transition> {
        if self.generation != generation || !self.status.is_outcome() {
            return None;
        }
        Some(self.set(SyncStatus::Idle))
    }

    fn set(&mut self, status: SyncStatus) -> Transition {
        self.status = status;
        self.generation += 1;
        Transition {
            status,
            generation: self.generation,
        }
    }
}
