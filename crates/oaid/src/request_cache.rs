//! Lifecycle table for cached request artefacts.
//!
//! Each cached harvest response is keyed by a request fingerprint. A producer
//! registers the key when it starts writing the artefact and marks it
//! finished once the artefact is complete. The only legal transition is
//! `Started -> Finished`; entries leave the table through the eviction sweep
//! or an explicit forced removal.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

const REGISTER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::request_cache");

/// Lifecycle state of a cached artefact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// A producer is writing the artefact.
    Started,
    /// The artefact is complete and may be served.
    Finished,
}

impl fmt::Display for RequestState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Started => "started",
            Self::Finished => "finished",
        })
    }
}

/// Snapshot of one register entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequestEntry {
    key: String,
    state: RequestState,
    created_at: Instant,
    finished_at: Option<Instant>,
}

impl CacheRequestEntry {
    /// Request fingerprint.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RequestState {
        self.state
    }

    /// When the producer registered the key.
    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the artefact was completed.
    #[must_use]
    pub const fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }
}

/// Rejected register operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Another producer is already writing this artefact.
    #[error("request '{key}' is already being cached")]
    InProgress {
        /// Request fingerprint.
        key: String,
    },
    /// The artefact is complete; it cannot be restarted.
    #[error("request '{key}' is already cached")]
    AlreadyFinished {
        /// Request fingerprint.
        key: String,
    },
    /// The key was never registered or has been evicted.
    #[error("request '{key}' is not registered")]
    NotRegistered {
        /// Request fingerprint.
        key: String,
    },
}

/// Thread-safe table of cached request artefacts.
///
/// One mutex guards the whole table, so a sweep can never interleave with a
/// concurrent transition of the same key.
#[derive(Debug, Default)]
pub struct RequestCacheRegister {
    entries: Mutex<HashMap<String, CacheRequestEntry>>,
}

impl RequestCacheRegister {
    /// Builds an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` as started now.
    pub fn register(&self, key: &str) -> Result<(), RegisterError> {
        self.register_at(key, Instant::now())
    }

    /// Registers `key` as started at `now`.
    pub fn register_at(&self, key: &str, now: Instant) -> Result<(), RegisterError> {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(key) {
            return Err(match existing.state {
                RequestState::Started => RegisterError::InProgress {
                    key: key.to_owned(),
                },
                RequestState::Finished => RegisterError::AlreadyFinished {
                    key: key.to_owned(),
                },
            });
        }
        entries.insert(
            key.to_owned(),
            CacheRequestEntry {
                key: key.to_owned(),
                state: RequestState::Started,
                created_at: now,
                finished_at: None,
            },
        );
        tracing::debug!(target: REGISTER_TARGET, key, "cache request started");
        Ok(())
    }

    /// Marks `key` finished now. Finishing twice is a no-op.
    pub fn mark_finished(&self, key: &str) -> Result<(), RegisterError> {
        self.mark_finished_at(key, Instant::now())
    }

    /// Marks `key` finished at `now`. Finishing twice is a no-op.
    pub fn mark_finished_at(&self, key: &str, now: Instant) -> Result<(), RegisterError> {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return Err(RegisterError::NotRegistered {
                key: key.to_owned(),
            });
        };
        if entry.state == RequestState::Started {
            entry.state = RequestState::Finished;
            entry.finished_at = Some(now);
            tracing::debug!(target: REGISTER_TARGET, key, "cache request finished");
        }
        Ok(())
    }

    /// Returns a snapshot of the entry for `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<CacheRequestEntry> {
        self.lock().get(key).cloned()
    }

    /// Entries still `Started` longer than `threshold` before `now`.
    ///
    /// These indicate a crashed or hung producer. They are reported only;
    /// clearing them is left to an operator through
    /// [`RequestCacheRegister::force_remove`].
    #[must_use]
    pub fn stalled(&self, now: Instant, threshold: Duration) -> Vec<CacheRequestEntry> {
        let mut stalled: Vec<_> = self
            .lock()
            .values()
            .filter(|entry| {
                entry.state == RequestState::Started
                    && now.saturating_duration_since(entry.created_at) > threshold
            })
            .cloned()
            .collect();
        stalled.sort_by(|left, right| left.key.cmp(&right.key));
        stalled
    }

    /// Removes `key` regardless of its state.
    pub fn force_remove(&self, key: &str) -> Option<CacheRequestEntry> {
        let removed = self.lock().remove(key);
        if removed.is_some() {
            tracing::warn!(target: REGISTER_TARGET, key, "cache request forcibly removed");
        }
        removed
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes finished entries completed more than `retention` before `now`
    /// and returns their keys.
    ///
    /// `on_evict` runs for each key while the table is still locked, so no
    /// producer can re-register the key until it returns.
    pub(crate) fn evict_finished<F>(
        &self,
        now: Instant,
        retention: Duration,
        mut on_evict: F,
    ) -> Vec<String>
    where
        F: FnMut(&str),
    {
        let mut evicted = Vec::new();
        self.lock().retain(|key, entry| {
            let expired = entry.state == RequestState::Finished
                && entry
                    .finished_at
                    .is_some_and(|finished| now.saturating_duration_since(finished) > retention);
            if expired {
                on_evict(key);
                evicted.push(key.clone());
            }
            !expired
        });
        evicted.sort();
        evicted
    }

    // Every critical section is a single map operation, so a poisoned lock
    // still guards a consistent table.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheRequestEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
