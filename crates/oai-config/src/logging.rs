//! Logging settings read from the logging properties.
//!
//! The file keeps its historical name but holds `tracing` configuration
//! under the `log.*` keys.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::defaults::{DEFAULT_LOG_FILE, default_log_filter, default_log_format};
use crate::properties::Properties;

/// Key holding the `tracing` filter expression.
pub const LOG_FILTER_KEY: &str = "log.filter";

/// Key selecting the output format.
pub const LOG_FORMAT_KEY: &str = "log.format";

/// Key naming the file written inside the log directory.
pub const LOG_FILE_KEY: &str = "log.file";

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Errors raised while reading the logging properties.
#[derive(Debug, Error)]
pub enum LogSettingsError {
    /// `log.format` named an unsupported format.
    #[error("unsupported log format '{value}': {source}")]
    Format {
        /// Value found in the properties.
        value: String,
        /// Underlying parse error.
        #[source]
        source: LogFormatParseError,
    },
}

/// Logging settings read from the logging properties resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` expression.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// File name used inside the log output directory.
    pub file_name: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter().to_owned(),
            format: default_log_format(),
            file_name: DEFAULT_LOG_FILE.to_owned(),
        }
    }
}

impl LogSettings {
    /// Reads the recognised logging keys, falling back to defaults for absent
    /// or blank values.
    pub fn from_properties(properties: &Properties) -> Result<Self, LogSettingsError> {
        let defaults = Self::default();
        let format = match properties.get_non_empty(LOG_FORMAT_KEY) {
            Some(value) => LogFormat::from_str(value).map_err(|source| LogSettingsError::Format {
                value: value.to_owned(),
                source,
            })?,
            None => defaults.format,
        };
        Ok(Self {
            filter: properties
                .get_non_empty(LOG_FILTER_KEY)
                .map_or(defaults.filter, str::to_owned),
            format,
            file_name: properties
                .get_non_empty(LOG_FILE_KEY)
                .map_or(defaults.file_name, str::to_owned),
        })
    }
}
