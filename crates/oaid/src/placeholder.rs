//! Placeholder collaborators wired into the binary until the persistence,
//! search and metadata-format subsystems are linked in.

use std::path::Path;
use std::sync::Arc;

use crate::collaborators::{
    CollaboratorError, Collaborators, LoggingSink, MetadataFormatLoader, Persistence, SearchIndex,
};
use crate::locator::ResolvedConfig;
use crate::set_cache::SetRecord;

const PLACEHOLDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::collaborators::noop");

/// Persistence layer that accepts any configuration and lists no sets.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoopPersistence;

impl Persistence for NoopPersistence {
    fn initialize(&self, config: &ResolvedConfig) -> Result<(), CollaboratorError> {
        tracing::warn!(
            target: PLACEHOLDER_TARGET,
            origin = %config.origin(),
            "database initialisation requested but no persistence layer is linked"
        );
        Ok(())
    }

    fn fetch_all_sets(&self) -> Result<Vec<SetRecord>, CollaboratorError> {
        tracing::warn!(
            target: PLACEHOLDER_TARGET,
            "set listing requested but no persistence layer is linked"
        );
        Ok(Vec::new())
    }
}

/// Search index that records attach requests without opening anything.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoopSearchIndex;

impl SearchIndex for NoopSearchIndex {
    fn attach(&self, path: &Path) -> Result<(), CollaboratorError> {
        tracing::warn!(
            target: PLACEHOLDER_TARGET,
            path = %path.display(),
            "search index attach requested but no index is linked"
        );
        Ok(())
    }
}

/// Metadata-format loader that records load requests without parsing.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoopMetadataFormatLoader;

impl MetadataFormatLoader for NoopMetadataFormatLoader {
    fn load(&self, formats_file: &Path, mapping_file: &Path) -> Result<(), CollaboratorError> {
        tracing::warn!(
            target: PLACEHOLDER_TARGET,
            formats = %formats_file.display(),
            mapping = %mapping_file.display(),
            "metadata format loading requested but no unmarshaler is linked"
        );
        Ok(())
    }
}

/// Collaborators used by the binary: placeholders plus the real logging sink.
pub(crate) fn placeholder_collaborators(logging: Arc<dyn LoggingSink>) -> Collaborators {
    Collaborators {
        persistence: Arc::new(NoopPersistence),
        search_index: Arc::new(NoopSearchIndex),
        metadata_formats: Arc::new(NoopMetadataFormatLoader),
        logging,
    }
}
