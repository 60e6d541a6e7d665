//! Typed view over the directory properties.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::properties::Properties;

/// Directory receiving log output in hosted deployments.
pub const LOG_DIR_KEY: &str = "logDir";

/// Directory holding metadata-format descriptors and stylesheets.
pub const RESOURCE_DIR_KEY: &str = "resourceDir";

/// Directory of the full-text search index.
pub const LUCENE_DIR_KEY: &str = "luceneDir";

/// Directory holding cached request artefacts.
pub const CACHE_DIR_KEY: &str = "cacheDir";

/// Typed view over the directory properties.
///
/// Blank values are treated exactly like missing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySettings {
    /// `logDir`.
    pub log_dir: Option<Utf8PathBuf>,
    /// `resourceDir`.
    pub resource_dir: Option<Utf8PathBuf>,
    /// `luceneDir`.
    pub lucene_dir: Option<Utf8PathBuf>,
    /// `cacheDir`.
    pub cache_dir: Option<Utf8PathBuf>,
}

impl DirectorySettings {
    /// Extracts the recognised keys from the directory properties.
    #[must_use]
    pub fn from_properties(properties: &Properties) -> Self {
        let path = |key: &str| properties.get_non_empty(key).map(Utf8PathBuf::from);
        Self {
            log_dir: path(LOG_DIR_KEY),
            resource_dir: path(RESOURCE_DIR_KEY),
            lucene_dir: path(LUCENE_DIR_KEY),
            cache_dir: path(CACHE_DIR_KEY),
        }
    }
}
