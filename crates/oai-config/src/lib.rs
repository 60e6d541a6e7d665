//! Configuration vocabulary shared by the OAI toolkit binaries.
//!
//! The harvesting server is configured through a handful of Java-style
//! `.properties` files whose names are part of the operational contract:
//! operators create files with exactly these names next to the server or in
//! the container's installation directory. This crate owns those names, the
//! parser for the file format, the typed views over the recognised keys, and
//! the deployment contexts that decide where the files are searched for.
//!
//! Resolution of the files themselves (embedded resources first, then the
//! candidate directories) lives in the `oaid` crate, which also sequences the
//! startup steps that consume these settings.

mod cli;
mod defaults;
mod deployment;
mod directory;
mod logging;
mod properties;
mod resources;
mod server;

pub use cli::{Cli, CliError};
pub use defaults::{
    DEFAULT_CACHE_RETENTION, DEFAULT_EVICTION_INTERVAL, DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER,
    DEFAULT_STALL_THRESHOLD, default_log_filter, default_log_format,
};
pub use deployment::{DeploymentContext, SequenceDirs};
pub use directory::{
    CACHE_DIR_KEY, DirectorySettings, LOG_DIR_KEY, LUCENE_DIR_KEY, RESOURCE_DIR_KEY,
};
pub use logging::{
    LOG_FILE_KEY, LOG_FILTER_KEY, LOG_FORMAT_KEY, LogFormat, LogFormatParseError, LogSettings,
    LogSettingsError,
};
pub use properties::{Properties, PropertiesError};
pub use resources::{
    DB_PROPERTIES, DIRECTORY_PROPERTIES, LOGGING_PROPERTIES, METADATA_FORMAT_MAPPING_FILE,
    METADATA_FORMATS_FILE, SERVER_PROPERTIES,
};
pub use server::{STORAGE_TYPE_KEY, ServerSettings, StorageType, StorageTypeParseError};
