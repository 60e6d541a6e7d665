//! Structured telemetry initialisation for the server.

use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use oai_config::{LogFormat, LogSettings};

use crate::collaborators::{CollaboratorError, CollaboratorKind, LoggingSink};
use crate::locator::ResolvedConfig;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to open the log file.
    #[error("failed to open log file '{}': {source}", .path.display())]
    LogFile {
        /// File that could not be opened.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Output goes to `<output_dir>/<file_name>` when a directory is supplied and
/// to stderr otherwise. The filter is validated on every call; only the first
/// successful call installs the subscriber and later calls return a fresh
/// [`TelemetryHandle`] without touching the global state again.
pub fn initialise(
    settings: &LogSettings,
    output_dir: Option<&Path>,
) -> Result<TelemetryHandle, TelemetryError> {
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(filter, settings, output_dir))
        .map(|_| TelemetryHandle)
}

/// Returns `true` once a subscriber has been installed by [`initialise`].
#[must_use]
pub fn is_initialised() -> bool {
    TELEMETRY_GUARD.get().is_some()
}

fn install_subscriber(
    filter: EnvFilter,
    settings: &LogSettings,
    output_dir: Option<&Path>,
) -> Result<(), TelemetryError> {
    let (writer, ansi) = match output_dir {
        Some(dir) => (
            BoxMakeWriter::new(Mutex::new(open_log_file(dir, &settings.file_name)?)),
            false,
        ),
        None => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

fn open_log_file(dir: &Path, file_name: &str) -> Result<File, TelemetryError> {
    let path = dir.join(file_name);
    fs::create_dir_all(dir)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(&path))
        .map_err(|source| TelemetryError::LogFile { path, source })
}

/// Logging backend that installs the `tracing` subscriber described by the
/// logging properties.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLoggingSink;

impl LoggingSink for TracingLoggingSink {
    fn initialize(
        &self,
        config: &ResolvedConfig,
        output_dir: Option<&Path>,
    ) -> Result<(), CollaboratorError> {
        let settings = LogSettings::from_properties(config.properties()).map_err(|source| {
            CollaboratorError::with_source(
                CollaboratorKind::Logging,
                format!("invalid logging properties in {}", config.origin()),
                source,
            )
        })?;
        initialise(&settings, output_dir).map(|_| ()).map_err(|source| {
            CollaboratorError::with_source(
                CollaboratorKind::Logging,
                "failed to install the log subscriber",
                source,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::ResourceOrigin;
    use oai_config::{LOG_FORMAT_KEY, Properties};

    #[test]
    fn invalid_filter_is_rejected_even_after_installation() {
        let settings = LogSettings {
            filter: "oaid=[".to_owned(),
            ..LogSettings::default()
        };
        let error = initialise(&settings, None).expect_err("filter must fail");
        assert!(matches!(error, TelemetryError::Filter(_)));
    }

    #[test]
    fn sink_reports_malformed_logging_properties() {
        let properties: Properties = [(LOG_FORMAT_KEY, "xml")].into_iter().collect();
        let config = ResolvedConfig::new(
            oai_config::LOGGING_PROPERTIES,
            ResourceOrigin::Embedded,
            properties,
        );
        let error = TracingLoggingSink
            .initialize(&config, None)
            .expect_err("format must fail");
        assert_eq!(error.kind, CollaboratorKind::Logging);
        assert!(error.message().contains("embedded"));
    }
}
