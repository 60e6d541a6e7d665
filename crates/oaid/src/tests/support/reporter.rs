//! Test double for [`HealthReporter`] that records structured events for
//! assertions.

use std::sync::Mutex;

use oai_config::DeploymentContext;

use crate::health::HealthReporter;
use crate::outcome::{InitError, InitOutcome, SequenceState};

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// The sequence started for the labelled deployment.
    SequenceStarting(&'static str),
    /// A step completed and the sequence entered the state.
    StepCompleted(SequenceState),
    /// A fatal step failed in the state.
    SequenceFailed {
        state: SequenceState,
        message: String,
    },
    /// The outcome, by label.
    SequenceFinished(&'static str),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// States entered, in order.
    #[must_use]
    pub fn states(&self) -> Vec<SequenceState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::StepCompleted(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn sequence_starting(&self, context: &DeploymentContext) {
        self.record(HealthEvent::SequenceStarting(context.label()));
    }

    fn step_completed(&self, state: SequenceState) {
        self.record(HealthEvent::StepCompleted(state));
    }

    fn sequence_failed(&self, state: SequenceState, error: &InitError) {
        self.record(HealthEvent::SequenceFailed {
            state,
            message: error.to_string(),
        });
    }

    fn sequence_finished(&self, outcome: &InitOutcome) {
        self.record(HealthEvent::SequenceFinished(outcome.label()));
    }
}
