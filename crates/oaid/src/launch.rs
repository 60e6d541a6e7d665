//! Process entry: command-line parsing, collaborator wiring and the startup
//! summary printed for operators.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use oai_config::{Cli, CliError, DeploymentContext, LogSettings};

use crate::bootstrap::{Environment, InitializationSequencer};
use crate::collaborators::Collaborators;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::locator::{ConfigLocator, RetryPolicy};
use crate::outcome::InitOutcome;
use crate::placeholder::placeholder_collaborators;
use crate::telemetry::{self, TelemetryError, TracingLoggingSink};

const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launch");

/// Errors surfaced before the startup sequence can run.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The command line was invalid.
    #[error("invalid command line: {source}")]
    Cli {
        /// Underlying parse error.
        #[source]
        source: CliError,
    },
    /// Default telemetry could not be installed after startup.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

impl From<CliError> for LaunchError {
    fn from(source: CliError) -> Self {
        Self::Cli { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

/// A finished startup: the shared environment and its outcome.
#[derive(Debug, Clone)]
pub struct Startup {
    /// Environment handed to request-serving code.
    pub environment: Arc<Environment>,
    /// Outcome published to the environment's ready gate.
    pub outcome: InitOutcome,
}

/// Parses `args`, runs the startup sequence with the linked collaborators
/// and returns the populated environment.
pub fn run_server<I, T>(args: I) -> Result<Startup, LaunchError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_args(args)?;
    let context = cli.deployment()?;
    let locator = ConfigLocator::default().with_retry(RetryPolicy::bounded(
        cli.resolve_attempts,
        cli.resolve_delay(),
    ));
    let collaborators = placeholder_collaborators(Arc::new(TracingLoggingSink));
    let startup = run_server_with(
        &context,
        locator,
        collaborators,
        Arc::new(StructuredHealthReporter::new()),
    );
    if !telemetry::is_initialised() {
        // No logging properties were found: keep default stderr logging.
        telemetry::initialise(&LogSettings::default(), None)?;
    }
    info!(
        target: LAUNCH_TARGET,
        outcome = startup.outcome.label(),
        "startup finished"
    );
    Ok(startup)
}

/// Runs the startup sequence with injected collaborators.
pub fn run_server_with(
    context: &DeploymentContext,
    locator: ConfigLocator,
    collaborators: Collaborators,
    reporter: Arc<dyn HealthReporter>,
) -> Startup {
    let environment = Arc::new(Environment::new());
    let sequencer = InitializationSequencer::new(locator, collaborators, reporter);
    let outcome = sequencer.run(&environment, context);
    Startup {
        environment,
        outcome,
    }
}

/// Writes the operator-facing summary of `outcome`, one line per
/// diagnostic.
pub fn write_summary<W: Write>(out: &mut W, outcome: &InitOutcome) -> io::Result<()> {
    match outcome {
        InitOutcome::FullyReady => writeln!(out, "oaid: server ready"),
        InitOutcome::DegradedReady { diagnostics } => {
            writeln!(
                out,
                "oaid: server ready in degraded mode ({} diagnostics)",
                diagnostics.len()
            )?;
            for entry in diagnostics {
                writeln!(out, "oaid: [{}] {}", entry.severity, entry.message)?;
            }
            Ok(())
        }
        InitOutcome::Failed { state, error } => {
            writeln!(out, "oaid: initialisation failed after {state}: {error}")
        }
    }
}
