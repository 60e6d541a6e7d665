//! Startup states, fatal errors, and the published startup outcome.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::ledger::LedgerEntry;
use crate::locator::LocateError;
use crate::set_cache::SetCacheError;

/// Progress of the startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceState {
    /// Nothing has run yet.
    NotStarted,
    /// Logging is configured, or was left at its defaults.
    LoggingReady,
    /// The persistence layer accepted its configuration.
    DbReady,
    /// The full-text search index is attached.
    SearchAttached,
    /// Sets are cached; the server may serve requests.
    SetsReady,
    /// A fatal step failed; the sequence stopped.
    Failed,
}

impl SequenceState {
    /// Returns `true` for states the sequence never leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::SetsReady | Self::Failed)
    }

    /// Returns `true` when moving from `self` to `next` is a legal forward
    /// step.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::LoggingReady)
                | (Self::LoggingReady, Self::DbReady)
                | (Self::DbReady, Self::SearchAttached | Self::SetsReady)
                | (Self::SearchAttached, Self::SetsReady)
                | (
                    Self::NotStarted | Self::LoggingReady | Self::DbReady | Self::SearchAttached,
                    Self::Failed
                )
        )
    }

    /// Validates and performs the move to `next`.
    pub fn advance(&mut self, next: Self) -> Result<(), InitError> {
        if !self.can_advance_to(next) {
            return Err(InitError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for SequenceState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::NotStarted => "not_started",
            Self::LoggingReady => "logging_ready",
            Self::DbReady => "db_ready",
            Self::SearchAttached => "search_attached",
            Self::SetsReady => "sets_ready",
            Self::Failed => "failed",
        })
    }
}

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum InitError {
    /// The environment has already been through a startup sequence.
    #[error("the startup sequence has already run for this environment")]
    AlreadyInitialized,
    /// A required configuration resource could not be resolved.
    #[error("required configuration unavailable: {source}")]
    ConfigNotFound {
        /// Underlying locator error.
        #[source]
        source: LocateError,
    },
    /// The persistence layer rejected its configuration.
    #[error("database initialisation failed: {source}")]
    DbInitFailed {
        /// Underlying collaborator error.
        #[source]
        source: CollaboratorError,
    },
    /// The directory properties do not name a resource directory.
    #[error("'resourceDir' is not configured; metadata formats cannot be loaded")]
    MissingResourceDir,
    /// The metadata-format descriptors failed to load.
    #[error("failed to load metadata formats: {source}")]
    MetadataFormats {
        /// Underlying collaborator error.
        #[source]
        source: CollaboratorError,
    },
    /// The set cache could not be populated.
    #[error("failed to populate the set cache: {source}")]
    SetCache {
        /// Underlying cache error.
        #[source]
        source: SetCacheError,
    },
    /// The sequence attempted an illegal state change.
    #[error("illegal startup transition from {from} to {to}")]
    InvalidTransition {
        /// State the sequence was in.
        from: SequenceState,
        /// State it tried to enter.
        to: SequenceState,
    },
}

/// What the startup sequence produced.
#[derive(Debug, Clone)]
pub enum InitOutcome {
    /// Every step succeeded without diagnostics.
    FullyReady,
    /// The server can serve requests with reduced functionality.
    DegradedReady {
        /// Ledger entries recorded during the sequence.
        diagnostics: Vec<LedgerEntry>,
    },
    /// A fatal step failed; request serving must not start.
    Failed {
        /// State reached before the failing step.
        state: SequenceState,
        /// Cause of the failure.
        error: Arc<InitError>,
    },
}

impl InitOutcome {
    /// Returns `true` unless the sequence failed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Diagnostics recorded on the way to a degraded start.
    #[must_use]
    pub fn diagnostics(&self) -> &[LedgerEntry] {
        match self {
            Self::DegradedReady { diagnostics } => diagnostics.as_slice(),
            Self::FullyReady | Self::Failed { .. } => &[],
        }
    }

    /// Short label used in telemetry.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FullyReady => "fully_ready",
            Self::DegradedReady { .. } => "degraded_ready",
            Self::Failed { .. } => "failed",
        }
    }
}
