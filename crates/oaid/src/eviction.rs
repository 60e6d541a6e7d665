//! Rate-limited sweeps over the request cache register.
//!
//! A sweep may be triggered before every request; the policy only lets one
//! through when the minimum interval since the previous sweep has elapsed.
//! This bounds sweep frequency rather than enforcing a precise per-entry TTL.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use oai_config::{DEFAULT_CACHE_RETENTION, DEFAULT_EVICTION_INTERVAL, DEFAULT_STALL_THRESHOLD};

use crate::cache_directory::CacheDirectory;
use crate::request_cache::RequestCacheRegister;

const EVICTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::eviction");

/// When the last sweep ran and how often sweeps may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionClock {
    last_sweep_at: Option<Instant>,
    min_interval: Duration,
}

impl EvictionClock {
    /// Builds a clock that has never swept.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_sweep_at: None,
            min_interval,
        }
    }

    /// When the last sweep ran, if ever.
    #[must_use]
    pub const fn last_sweep_at(&self) -> Option<Instant> {
        self.last_sweep_at
    }

    /// Minimum interval between sweeps.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns `true` when a sweep may run at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_sweep_at
            .is_none_or(|last| now.saturating_duration_since(last) > self.min_interval)
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.last_sweep_at.map_or(Duration::ZERO, |last| {
            self.min_interval
                .saturating_sub(now.saturating_duration_since(last))
        })
    }
}

impl Default for EvictionClock {
    fn default() -> Self {
        Self::new(DEFAULT_EVICTION_INTERVAL)
    }
}

/// What a sweep removed and what it found suspicious.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Keys of finished entries removed from the register.
    pub evicted: Vec<String>,
    /// Keys of entries stuck in `Started` past the stall threshold.
    pub stalled: Vec<String>,
    /// Number of artefact files deleted from the cache directory.
    pub artifacts_removed: usize,
}

/// Result of a sweep trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// The minimum interval has not elapsed; nothing was touched.
    Skipped {
        /// Time left until the next sweep may run.
        next_due_in: Duration,
    },
    /// The sweep ran.
    Swept(SweepReport),
}

impl SweepOutcome {
    /// Returns `true` when the sweep actually ran.
    #[must_use]
    pub const fn ran(&self) -> bool {
        matches!(self, Self::Swept(_))
    }
}

/// Decides when finished artefacts are swept out of the register.
#[derive(Debug)]
pub struct CacheEvictionPolicy {
    clock: Mutex<EvictionClock>,
    retention: Duration,
    stall_threshold: Duration,
}

impl Default for CacheEvictionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EVICTION_INTERVAL, DEFAULT_CACHE_RETENTION)
    }
}

impl CacheEvictionPolicy {
    /// Builds a policy sweeping at most once per `min_interval` and evicting
    /// artefacts finished more than `retention` ago.
    #[must_use]
    pub const fn new(min_interval: Duration, retention: Duration) -> Self {
        Self {
            clock: Mutex::new(EvictionClock::new(min_interval)),
            retention,
            stall_threshold: DEFAULT_STALL_THRESHOLD,
        }
    }

    /// Replaces the age after which started entries are reported as stalled.
    #[must_use]
    pub const fn with_stall_threshold(mut self, stall_threshold: Duration) -> Self {
        self.stall_threshold = stall_threshold;
        self
    }

    /// Snapshot of the sweep clock.
    #[must_use]
    pub fn clock(&self) -> EvictionClock {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sweeps the register when the interval has elapsed.
    pub fn maybe_sweep(&self, register: &RequestCacheRegister, now: Instant) -> SweepOutcome {
        self.sweep(register, None, now)
    }

    /// Sweeps the register and deletes the evicted artefacts from `cache`.
    pub fn sweep_with(
        &self,
        register: &RequestCacheRegister,
        cache: &CacheDirectory,
        now: Instant,
    ) -> SweepOutcome {
        self.sweep(register, Some(cache), now)
    }

    fn sweep(
        &self,
        register: &RequestCacheRegister,
        cache: Option<&CacheDirectory>,
        now: Instant,
    ) -> SweepOutcome {
        // Holding the clock for the whole sweep serialises concurrent
        // triggers: the loser sees the updated timestamp and skips.
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        if !clock.is_due(now) {
            return SweepOutcome::Skipped {
                next_due_in: clock.remaining(now),
            };
        }

        let mut artifacts_removed = 0;
        let evicted = register.evict_finished(now, self.retention, |key| {
            if let Some(dir) = cache
                && remove_artifact(dir, key)
            {
                artifacts_removed += 1;
            }
        });
        let stalled: Vec<String> = register
            .stalled(now, self.stall_threshold)
            .into_iter()
            .map(|entry| entry.key().to_owned())
            .collect();
        clock.last_sweep_at = Some(now);

        if !stalled.is_empty() {
            tracing::warn!(
                target: EVICTION_TARGET,
                stalled = ?stalled,
                "cache requests stuck in started state need manual cleanup"
            );
        }
        tracing::info!(
            target: EVICTION_TARGET,
            evicted = evicted.len(),
            artifacts_removed,
            "cache sweep completed"
        );

        SweepOutcome::Swept(SweepReport {
            evicted,
            stalled,
            artifacts_removed,
        })
    }
}

fn remove_artifact(cache: &CacheDirectory, key: &str) -> bool {
    match cache.remove_artifact(key) {
        Ok(removed) => removed,
        Err(error) => {
            tracing::warn!(
                target: EVICTION_TARGET,
                key = %key,
                error = %error,
                "failed to delete cached artefact"
            );
            false
        }
    }
}
