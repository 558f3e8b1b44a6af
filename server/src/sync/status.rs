//! Shared sync status with change notification.
//!
//! Wraps the engine's [`SyncSignal`] so every handler and background task
//! sees one status, and publishes each transition on a watch channel for
//! WebSocket clients. Outcomes settle back to idle after a linger period.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use humidor_engine::{SyncActivity, SyncSignal, SyncStatus, Transition};
use serde::Serialize;
use tokio::sync::watch;

/// Status as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: SyncStatus,
    pub generation: u64,
    pub changed_at: DateTime<Utc>,
}

impl StatusSnapshot {
    fn from_transition(transition: Transition) -> Self {
        Self {
            status: transition.status,
            generation: transition.generation,
            changed_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    signal: Mutex<SyncSignal>,
    sender: watch::Sender<StatusSnapshot>,
    linger: Option<Duration>,
}

/// Handle to the shared status. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    inner: Arc<Inner>,
}

impl StatusChannel {
    /// `linger` is how long an outcome stays before settling to idle;
    /// `None` keeps it until the next transition.
    pub fn new(linger: Option<Duration>) -> Self {
        let signal = SyncSignal::new();
        let (sender, _) = watch::channel(StatusSnapshot {
            status: signal.status(),
            generation: signal.generation(),
            changed_at: Utc::now(),
        });

        Self {
            inner: Arc::new(Inner {
                signal: Mutex::new(signal),
                sender,
                linger,
            }),
        }
    }

    fn signal(&self) -> MutexGuard<'_, SyncSignal> {
        self.inner
            .signal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> StatusSnapshot {
        self.inner.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.inner.sender.subscribe()
    }

    pub fn begin(&self, activity: SyncActivity) {
        let mut signal = self.signal();
        let transition = signal.begin(activity);
        self.publish(transition);
    }

    pub fn finish(&self, ok: bool) {
        let transition = {
            let mut signal = self.signal();
            let transition = signal.finish(ok);
            self.publish(transition);
            transition
        };

        if let Some(linger) = self.inner.linger {
            let channel = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(linger).await;
                channel.settle(transition.generation);
            });
        }
    }

    /// Return to idle if nothing happened since `generation`.
    pub fn settle(&self, generation: u64) -> bool {
        let mut signal = self.signal();
        match signal.settle(generation) {
            Some(transition) => {
                self.publish(transition);
                true
            }
            None => false,
        }
    }

    // Called with the signal locked so snapshots go out in transition order.
    fn publish(&self, transition: Transition) {
        tracing::debug!(
            status = %transition.status,
            generation = transition.generation,
            "Sync status changed"
        );
        self.inner
            .sender
            .send_replace(StatusSnapshot::from_transition(transition));
    }
}
