//! Test collaborators: record every call and support injected failures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::collaborators::{
    CollaboratorError, CollaboratorKind, Collaborators, LoggingSink, MetadataFormatLoader,
    Persistence, SearchIndex,
};
use crate::locator::{ResolvedConfig, ResourceOrigin};
use crate::set_cache::SetRecord;

/// Calls observed by the recording collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorCall {
    /// The logging sink received the logging properties.
    Logging {
        origin: ResourceOrigin,
        output_dir: Option<PathBuf>,
    },
    /// The persistence layer received the database properties.
    DbInit { origin: ResourceOrigin },
    /// The set listing was requested.
    FetchSets,
    /// The search index was attached.
    Attach(PathBuf),
    /// The metadata formats were loaded.
    LoadFormats { formats: PathBuf, mapping: PathBuf },
}

/// Places where a failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Logging,
    DbInit,
    SetListing,
    Attach,
    MetadataFormats,
}

impl FailurePoint {
    const fn kind(self) -> CollaboratorKind {
        match self {
            Self::Logging => CollaboratorKind::Logging,
            Self::DbInit | Self::SetListing => CollaboratorKind::Persistence,
            Self::Attach => CollaboratorKind::SearchIndex,
            Self::MetadataFormats => CollaboratorKind::MetadataFormats,
        }
    }
}

/// One double implementing every collaborator trait.
#[derive(Clone, Default)]
pub struct RecordingCollaborators {
    state: Arc<Mutex<CollaboratorState>>,
}

impl RecordingCollaborators {
    /// Sets returned by the persistence layer.
    pub fn list_sets(&self, sets: Vec<SetRecord>) {
        let mut state = self.state.lock().expect("collaborator state mutex poisoned");
        state.sets = sets;
    }

    /// Configures the double to fail at `point`.
    pub fn fail_on(&self, point: FailurePoint, message: impl Into<String>) {
        let mut state = self.state.lock().expect("collaborator state mutex poisoned");
        state.failures.insert(point, message.into());
    }

    /// Returns every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<CollaboratorCall> {
        let state = self.state.lock().expect("collaborator state mutex poisoned");
        state.calls.clone()
    }

    /// Returns `true` when a call matching `predicate` was recorded.
    #[must_use]
    pub fn called(&self, predicate: impl Fn(&CollaboratorCall) -> bool) -> bool {
        self.calls().iter().any(predicate)
    }

    /// Wires the double into every collaborator slot.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            persistence: Arc::new(self.clone()),
            search_index: Arc::new(self.clone()),
            metadata_formats: Arc::new(self.clone()),
            logging: Arc::new(self.clone()),
        }
    }

    fn observe(&self, call: CollaboratorCall, point: FailurePoint) -> Result<(), CollaboratorError> {
        let failure = {
            let mut state = self.state.lock().expect("collaborator state mutex poisoned");
            state.calls.push(call);
            state.failures.get(&point).cloned()
        };
        match failure {
            Some(message) => Err(CollaboratorError::new(point.kind(), message)),
            None => Ok(()),
        }
    }
}

impl Persistence for RecordingCollaborators {
    fn initialize(&self, config: &ResolvedConfig) -> Result<(), CollaboratorError> {
        self.observe(
            CollaboratorCall::DbInit {
                origin: config.origin().clone(),
            },
            FailurePoint::DbInit,
        )
    }

    fn fetch_all_sets(&self) -> Result<Vec<SetRecord>, CollaboratorError> {
        self.observe(CollaboratorCall::FetchSets, FailurePoint::SetListing)?;
        let state = self.state.lock().expect("collaborator state mutex poisoned");
        Ok(state.sets.clone())
    }
}

impl SearchIndex for RecordingCollaborators {
    fn attach(&self, path: &Path) -> Result<(), CollaboratorError> {
        self.observe(
            CollaboratorCall::Attach(path.to_path_buf()),
            FailurePoint::Attach,
        )
    }
}

impl MetadataFormatLoader for RecordingCollaborators {
    fn load(&self, formats_file: &Path, mapping_file: &Path) -> Result<(), CollaboratorError> {
        self.observe(
            CollaboratorCall::LoadFormats {
                formats: formats_file.to_path_buf(),
                mapping: mapping_file.to_path_buf(),
            },
            FailurePoint::MetadataFormats,
        )
    }
}

impl LoggingSink for RecordingCollaborators {
    fn initialize(
        &self,
        config: &ResolvedConfig,
        output_dir: Option<&Path>,
    ) -> Result<(), CollaboratorError> {
        self.observe(
            CollaboratorCall::Logging {
                origin: config.origin().clone(),
                output_dir: output_dir.map(Path::to_path_buf),
            },
            FailurePoint::Logging,
        )
    }
}

#[derive(Default)]
struct CollaboratorState {
    sets: Vec<SetRecord>,
    calls: Vec<CollaboratorCall>,
    failures: HashMap<FailurePoint, String>,
}
