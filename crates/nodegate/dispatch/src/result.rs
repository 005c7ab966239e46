//! Single-delivery, replayable result slot
//!
//! A [`ResultSlot`] moves exactly once from *pending* to *resolved*. Any
//! number of consumers may observe it, before or after resolution, and all
//! of them see the same value. Observers registered while pending are kept
//! in a list that is drained on the transition; observers registered after
//! resolution run immediately.

use nodegate_types::{WorkflowExecutionError, WorkflowOutcome};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::watch;
use tracing::error;

/// Returned when a slot is resolved a second time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Result slot already resolved")]
pub struct AlreadyResolved;

type Observer = Box<dyn FnOnce(&WorkflowOutcome) + Send + 'static>;

enum SlotState {
    Pending(Vec<Observer>),
    Resolved(WorkflowOutcome),
}

struct SlotInner {
    state: Mutex<SlotState>,
    /// Flips to `true` once `state` is resolved; wakes async waiters.
    resolved_tx: watch::Sender<bool>,
}

/// Shared handle to a workflow's terminal value
#[derive(Clone)]
pub struct ResultSlot {
    inner: Arc<SlotInner>,
}

impl ResultSlot {
    pub fn new() -> Self {
        let (resolved_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(SlotInner {
                state: Mutex::new(SlotState::Pending(Vec::new())),
                resolved_tx,
            }),
        }
    }

    /// Resolve the slot. The first call wins; any later call is rejected.
    ///
    /// The value is observable through [`try_get`](Self::try_get) before
    /// any observer runs. Observers run on the calling thread, and have all
    /// run by the time [`wait`](Self::wait) returns to anyone. A panicking
    /// observer is logged and skipped; it does not stop the others or the
    /// waiters.
    pub fn resolve(&self, outcome: WorkflowOutcome) -> Result<(), AlreadyResolved> {
        let observers = {
            let mut state = self.lock();
            let observers = match &mut *state {
                SlotState::Resolved(_) => return Err(AlreadyResolved),
                SlotState::Pending(observers) => std::mem::take(observers),
            };
            *state = SlotState::Resolved(outcome.clone());
            observers
        };

        for observer in observers {
            if panic::catch_unwind(AssertUnwindSafe(|| observer(&outcome))).is_err() {
                error!("Result observer panicked");
            }
        }

        self.inner.resolved_tx.send_replace(true);
        Ok(())
    }

    /// Run `observer` once the slot is resolved, or right away if it already is.
    pub fn on_resolved<F>(&self, observer: F)
    where
        F: FnOnce(&WorkflowOutcome) + Send + 'static,
    {
        let resolved = {
            let mut state = self.lock();
            match &mut *state {
                SlotState::Pending(observers) => {
                    observers.push(Box::new(observer));
                    return;
                }
                SlotState::Resolved(outcome) => outcome.clone(),
            }
        };
        observer(&resolved);
    }

    /// Wait for the terminal value.
    pub async fn wait(&self) -> WorkflowOutcome {
        let mut resolved_rx = self.inner.resolved_tx.subscribe();
        if resolved_rx.wait_for(|resolved| *resolved).await.is_ok() {
            if let Some(outcome) = self.try_get() {
                return outcome;
            }
        }
        // unreachable while `self` keeps the sender alive
        Err(WorkflowExecutionError::abandoned(
            "result slot dropped before resolution",
        ))
    }

    /// The terminal value, if already resolved.
    pub fn try_get(&self) -> Option<WorkflowOutcome> {
        match &*self.lock() {
            SlotState::Pending(_) => None,
            SlotState::Resolved(outcome) => Some(outcome.clone()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.lock(), SlotState::Resolved(_))
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // observers run outside the lock, so a poisoned lock still holds a consistent state
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ResultSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResultSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.lock() {
            SlotState::Pending(observers) => f
                .debug_struct("ResultSlot")
                .field("state", &"pending")
                .field("observers", &observers.len())
                .finish(),
            SlotState::Resolved(outcome) => f
                .debug_struct("ResultSlot")
                .field("state", &"resolved")
                .field("outcome", outcome)
                .finish(),
        }
    }
}
