//! Bidirectional index between set identifiers and set specs.
//!
//! The cache is read by every request thread and written only during
//! startup. Readers take a cheap clone of the current snapshot; writers build
//! a new snapshot and swap it in, so a reader never observes a half-applied
//! update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collaborators::{CollaboratorError, Persistence};

const SETS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::set_cache");

/// A set as listed by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetRecord {
    /// Numeric identifier.
    pub id: i32,
    /// Human-readable spec token.
    pub spec: String,
}

impl SetRecord {
    /// Builds a record.
    #[must_use]
    pub fn new(id: i32, spec: impl Into<String>) -> Self {
        Self {
            id,
            spec: spec.into(),
        }
    }
}

/// Lookup misses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetLookupError {
    /// No set carries the identifier.
    #[error("no set with id {0}")]
    IdNotFound(i32),
    /// No set carries the spec.
    #[error("no set with spec '{0}'")]
    SpecNotFound(String),
}

/// Failures while filling the cache.
#[derive(Debug, Error)]
pub enum SetCacheError {
    /// The persistence layer could not list the sets.
    #[error("failed to fetch sets: {source}")]
    Fetch {
        /// Underlying collaborator error.
        #[source]
        source: CollaboratorError,
    },
}

#[derive(Debug, Clone, Default)]
struct SetIndex {
    spec_by_id: HashMap<i32, String>,
    id_by_spec: HashMap<String, i32>,
}

impl SetIndex {
    /// Binds `id` and `spec` to each other, unbinding whatever either of them
    /// was paired with before so both maps stay inverse.
    fn bind(&mut self, record: SetRecord) {
        let SetRecord { id, spec } = record;
        if let Some(previous_spec) = self.spec_by_id.insert(id, spec.clone())
            && previous_spec != spec
        {
            self.id_by_spec.remove(&previous_spec);
        }
        if let Some(previous_id) = self.id_by_spec.insert(spec, id)
            && previous_id != id
        {
            self.spec_by_id.remove(&previous_id);
        }
    }
}

/// Read-mostly cache of the repository's sets.
#[derive(Debug, Default)]
pub struct SetCache {
    snapshot: RwLock<Arc<SetIndex>>,
    writer: Mutex<()>,
}

impl SetCache {
    /// Builds an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches every set and merges it into the cache.
    ///
    /// Ids and specs present in the listing overwrite earlier bindings.
    /// Entries absent from the listing are kept; use [`SetCache::reload`] to
    /// drop them.
    pub fn populate(&self, persistence: &dyn Persistence) -> Result<usize, SetCacheError> {
        self.apply(persistence, false)
    }

    /// Fetches every set and replaces the cache contents with the listing.
    pub fn reload(&self, persistence: &dyn Persistence) -> Result<usize, SetCacheError> {
        self.apply(persistence, true)
    }

    /// Returns the spec bound to `id`.
    pub fn spec_by_id(&self, id: i32) -> Result<String, SetLookupError> {
        self.current()
            .spec_by_id
            .get(&id)
            .cloned()
            .ok_or(SetLookupError::IdNotFound(id))
    }

    /// Returns the id bound to `spec`.
    pub fn id_by_spec(&self, spec: &str) -> Result<i32, SetLookupError> {
        self.current()
            .id_by_spec
            .get(spec)
            .copied()
            .ok_or_else(|| SetLookupError::SpecNotFound(spec.to_owned()))
    }

    /// Number of cached sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current().spec_by_id.len()
    }

    /// Returns `true` when no set is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current().spec_by_id.is_empty()
    }

    /// Every cached set, ordered by id.
    #[must_use]
    pub fn records(&self) -> Vec<SetRecord> {
        let snapshot = self.current();
        let mut records: Vec<SetRecord> = snapshot
            .spec_by_id
            .iter()
            .map(|(id, spec)| SetRecord::new(*id, spec.clone()))
            .collect();
        records.sort_by_key(|record| record.id);
        records
    }

    fn apply(&self, persistence: &dyn Persistence, replace: bool) -> Result<usize, SetCacheError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let records = persistence
            .fetch_all_sets()
            .map_err(|source| SetCacheError::Fetch { source })?;
        let fetched = records.len();

        let mut next = if replace {
            SetIndex::default()
        } else {
            (*self.current()).clone()
        };
        for record in records {
            next.bind(record);
        }

        let size = next.spec_by_id.len();
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        tracing::info!(target: SETS_TARGET, fetched, cached = size, replace, "set cache updated");
        Ok(fetched)
    }

    // Snapshots are swapped whole, so a poisoned lock still holds a complete
    // index.
    fn current(&self) -> Arc<SetIndex> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }
}
