//! Shared default values for logging and cache maintenance.

use std::time::Duration;

/// Default log filter expression used when the logging properties omit one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// File name written inside the log directory when the logging properties
/// omit `log.file`.
pub const DEFAULT_LOG_FILE: &str = "oaid.log";

/// Minimum interval between two sweeps over the request cache register.
pub const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Age after which a finished cached artefact becomes eligible for eviction.
pub const DEFAULT_CACHE_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Age after which an unfinished cached artefact is reported as stalled.
pub const DEFAULT_STALL_THRESHOLD: Duration = Duration::from_secs(30 * 60);

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
