//! Names of the configuration resources and descriptor files.
//!
//! Operators create files with these exact names, so they must never change.

/// Server-level settings consumed by the protocol and persistence layers.
pub const SERVER_PROPERTIES: &str = "OAIToolkit.server.properties";

/// Logging configuration.
pub const LOGGING_PROPERTIES: &str = "OAIToolkit.log4j.properties";

/// Database connection settings.
pub const DB_PROPERTIES: &str = "OAIToolkit.db.properties";

/// Directory layout: `logDir`, `resourceDir`, `luceneDir` and `cacheDir`.
pub const DIRECTORY_PROPERTIES: &str = "OAIToolkit.directory.properties";

/// Metadata-format descriptor, looked up inside `resourceDir`.
pub const METADATA_FORMATS_FILE: &str = "metadataFormats.xml";

/// Mapping file accompanying the metadata-format descriptor.
pub const METADATA_FORMAT_MAPPING_FILE: &str = "metadata-format-mapping.xml";
