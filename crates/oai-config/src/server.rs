//! Server properties: which storage backend serves harvest queries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::properties::Properties;

/// Key in the server properties naming the record storage backend.
pub const STORAGE_TYPE_KEY: &str = "storageType";

/// Where harvestable records are queried from.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StorageType {
    /// The primary relational store.
    #[default]
    Mysql,
    /// A full-text search index attached at startup.
    Lucene,
}

impl StorageType {
    /// Returns `true` for storage backends that need a search index handle.
    #[must_use]
    pub const fn needs_search_index(self) -> bool {
        !matches!(self, Self::Mysql)
    }
}

/// Error returned when `storageType` holds an unsupported value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported storage type '{0}'")]
pub struct StorageTypeParseError(String);

impl StorageTypeParseError {
    /// Returns the offending value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_str()
    }
}

/// The part of the server properties this crate understands.
///
/// All other keys are opaque and handed to the protocol layer untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Configured storage backend.
    pub storage_type: StorageType,
}

impl ServerSettings {
    /// Reads the storage type, defaulting to the relational store when the
    /// key is absent.
    pub fn from_properties(properties: &Properties) -> Result<Self, StorageTypeParseError> {
        let storage_type = match properties.get_non_empty(STORAGE_TYPE_KEY) {
            Some(value) => StorageType::from_str(value)
                .map_err(|_| StorageTypeParseError(value.to_owned()))?,
            None => StorageType::default(),
        };
        Ok(Self { storage_type })
    }
}
