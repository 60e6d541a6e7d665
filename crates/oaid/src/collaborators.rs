//! Interfaces of the external subsystems the bootstrap hands control to.
//!
//! The persistence layer, the full-text search index, the metadata-format
//! unmarshaler and the logging backend are implemented elsewhere. The startup
//! sequence only locates their configuration and calls them through these
//! traits, so tests and alternative deployments can substitute their own
//! implementations.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::locator::ResolvedConfig;
use crate::set_cache::SetRecord;

/// External subsystems driven during startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaboratorKind {
    /// The logging backend.
    Logging,
    /// The relational persistence layer.
    Persistence,
    /// The full-text search index.
    SearchIndex,
    /// The metadata-format descriptor loader.
    MetadataFormats,
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Logging => "logging",
            Self::Persistence => "persistence",
            Self::SearchIndex => "search_index",
            Self::MetadataFormats => "metadata_formats",
        };
        formatter.write_str(label)
    }
}

/// Failure reported by an external subsystem.
#[derive(Debug, Error)]
#[error("{kind} failed: {message}")]
pub struct CollaboratorError {
    /// Subsystem that failed.
    pub kind: CollaboratorKind,
    message: String,
    /// Optional source error reported by the implementation.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CollaboratorError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(kind: CollaboratorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        kind: CollaboratorKind,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// The persistence layer.
#[cfg_attr(test, mockall::automock)]
pub trait Persistence: Send + Sync {
    /// Opens the database described by the resolved database properties.
    fn initialize(&self, config: &ResolvedConfig) -> Result<(), CollaboratorError>;

    /// Lists every set known to the repository.
    fn fetch_all_sets(&self) -> Result<Vec<SetRecord>, CollaboratorError>;
}

/// The full-text search index.
#[cfg_attr(test, mockall::automock)]
pub trait SearchIndex: Send + Sync {
    /// Attaches the index stored in `path`.
    fn attach(&self, path: &Path) -> Result<(), CollaboratorError>;
}

/// The metadata-format descriptor loader.
#[cfg_attr(test, mockall::automock)]
pub trait MetadataFormatLoader: Send + Sync {
    /// Loads the descriptor and its mapping file.
    fn load(&self, formats_file: &Path, mapping_file: &Path) -> Result<(), CollaboratorError>;
}

/// The logging backend.
pub trait LoggingSink: Send + Sync {
    /// Activates logging with the resolved logging properties, writing into
    /// `output_dir` when one is known.
    fn initialize(
        &self,
        config: &ResolvedConfig,
        output_dir: Option<&Path>,
    ) -> Result<(), CollaboratorError>;
}

/// The full set of subsystems wired into a startup sequence.
#[derive(Clone)]
pub struct Collaborators {
    /// Persistence layer.
    pub persistence: Arc<dyn Persistence>,
    /// Search index.
    pub search_index: Arc<dyn SearchIndex>,
    /// Metadata-format loader.
    pub metadata_formats: Arc<dyn MetadataFormatLoader>,
    /// Logging backend.
    pub logging: Arc<dyn LoggingSink>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_names_the_subsystem() {
        let error = CollaboratorError::new(CollaboratorKind::Persistence, "connection refused");
        assert_eq!(error.to_string(), "persistence failed: connection refused");
        assert_eq!(error.message(), "connection refused");
    }
}
