//! Append-only record of non-fatal startup problems.
//!
//! Operators read the ledger to understand why the server runs in degraded
//! mode. Entries keep their insertion order and are never removed for the
//! lifetime of the process.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

const LEDGER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::ledger");

/// How serious a ledger entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The server continues with its intended behaviour, possibly after a
    /// corrective action such as creating a directory.
    Warning,
    /// A feature is unavailable.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Entry severity.
    pub severity: Severity,
    /// Free-text message.
    pub message: String,
}

/// Ordered, never-truncated list of diagnostics.
#[derive(Debug, Default)]
pub struct ErrorLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl ErrorLedger {
    /// Builds an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error-level message.
    pub fn record(&self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    /// Appends a warning-level message.
    pub fn warn(&self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    /// Snapshot of every message in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Snapshot of every entry, including severities.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().clone()
    }

    /// Entries appended at or after position `start`.
    #[must_use]
    pub fn entries_since(&self, start: usize) -> Vec<LedgerEntry> {
        self.lock().iter().skip(start).cloned().collect()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, severity: Severity, message: String) {
        match severity {
            Severity::Warning => {
                tracing::warn!(target: LEDGER_TARGET, message = %message, "startup diagnostic");
            }
            Severity::Error => {
                tracing::error!(target: LEDGER_TARGET, message = %message, "startup diagnostic");
            }
        }
        self.lock().push(LedgerEntry { severity, message });
    }

    // Appends never leave the vector half-updated, so a poisoned lock still
    // guards consistent data.
    fn lock(&self) -> MutexGuard<'_, Vec<LedgerEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
