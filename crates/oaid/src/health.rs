//! Structured health reporting for startup lifecycle events.

use oai_config::DeploymentContext;

use crate::outcome::{InitError, InitOutcome, SequenceState};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface startup events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before the first step runs.
    fn sequence_starting(&self, context: &DeploymentContext);

    /// Invoked after each successful state change.
    fn step_completed(&self, state: SequenceState);

    /// Invoked when a fatal step fails in `state`.
    fn sequence_failed(&self, state: SequenceState, error: &InitError);

    /// Invoked once the outcome is known, including failures.
    fn sequence_finished(&self, outcome: &InitOutcome);
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn sequence_starting(&self, context: &DeploymentContext) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "sequence_starting",
            deployment = context.label(),
            "starting server initialisation"
        );
    }

    fn step_completed(&self, state: SequenceState) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "step_completed",
            state = %state,
            "startup step completed"
        );
    }

    fn sequence_failed(&self, state: SequenceState, error: &InitError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "sequence_failed",
            state = %state,
            error = %error,
            "server initialisation failed"
        );
    }

    fn sequence_finished(&self, outcome: &InitOutcome) {
        match outcome {
            InitOutcome::FullyReady => tracing::info!(
                target: HEALTH_TARGET,
                event = "sequence_finished",
                outcome = outcome.label(),
                "server ready"
            ),
            InitOutcome::DegradedReady { diagnostics } => tracing::warn!(
                target: HEALTH_TARGET,
                event = "sequence_finished",
                outcome = outcome.label(),
                diagnostics = diagnostics.len(),
                "server ready in degraded mode"
            ),
            InitOutcome::Failed { state, .. } => tracing::error!(
                target: HEALTH_TARGET,
                event = "sequence_finished",
                outcome = outcome.label(),
                state = %state,
                "server not ready"
            ),
        }
    }
}
