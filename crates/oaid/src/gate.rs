//! One-shot barrier between startup and request serving.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::outcome::InitOutcome;

/// Misuse of the ready gate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// An outcome was already published.
    #[error("startup outcome has already been published")]
    AlreadyPublished,
    /// No outcome was published within the allotted time.
    #[error("no startup outcome after {waited:?}")]
    TimedOut {
        /// How long the caller waited.
        waited: Duration,
    },
}

/// Holds the startup outcome and releases waiters once it is published.
#[derive(Debug, Default)]
pub struct ReadyGate {
    outcome: Mutex<Option<InitOutcome>>,
    published: Condvar,
}

impl ReadyGate {
    /// Builds a closed gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the gate with `outcome`. Only the first call succeeds.
    pub fn publish(&self, outcome: InitOutcome) -> Result<(), GateError> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(GateError::AlreadyPublished);
        }
        *slot = Some(outcome);
        drop(slot);
        self.published.notify_all();
        Ok(())
    }

    /// Blocks until an outcome is published and returns it.
    #[must_use]
    pub fn wait(&self) -> InitOutcome {
        let mut guard = self.lock();
        loop {
            if let Some(outcome) = guard.as_ref() {
                return outcome.clone();
            }
            guard = self
                .published
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks for at most `timeout` waiting for the outcome.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<InitOutcome, GateError> {
        let (guard, _) = self
            .published
            .wait_timeout_while(self.lock(), timeout, |slot| slot.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .cloned()
            .ok_or(GateError::TimedOut { waited: timeout })
    }

    /// The outcome, if already published.
    #[must_use]
    pub fn outcome(&self) -> Option<InitOutcome> {
        self.lock().clone()
    }

    /// Returns `true` once an outcome is published.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<InitOutcome>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
