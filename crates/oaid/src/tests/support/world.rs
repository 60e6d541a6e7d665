//! BDD test world: a temporary deployment, recording collaborators and the
//! environment a startup sequence runs against.

use std::cell::RefCell;
use std::sync::Arc;

use camino::Utf8PathBuf;

use oai_config::DeploymentContext;

use crate::bootstrap::{Environment, InitializationSequencer};
use crate::locator::ConfigLocator;
use crate::outcome::InitOutcome;

use super::collaborators::RecordingCollaborators;
use super::layout::Layout;
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    pub layout: Layout,
    pub collaborators: RecordingCollaborators,
    pub reporter: Arc<RecordingHealthReporter>,
    pub environment: Arc<Environment>,
    locator: ConfigLocator,
    context: Option<DeploymentContext>,
    outcome: Option<InitOutcome>,
}

impl TestWorld {
    /// Builds a world with an empty layout and no embedded resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            layout: Layout::new(),
            collaborators: RecordingCollaborators::default(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            environment: Arc::new(Environment::new()),
            locator: ConfigLocator::default(),
            context: None,
            outcome: None,
        }
    }

    /// Directory holding the properties files.
    #[must_use]
    pub fn config_dir(&self) -> Utf8PathBuf {
        self.layout.dir("conf")
    }

    /// Selects standalone mode with the configuration directory as log dir.
    pub fn use_standalone(&mut self) {
        self.context = Some(DeploymentContext::Standalone {
            log_dir: self.config_dir(),
        });
    }

    /// Selects hosted mode with the configuration directory as bin dir.
    pub fn use_hosted(&mut self) {
        self.context = Some(DeploymentContext::Hosted {
            bin_dir: self.config_dir(),
        });
    }

    /// Replaces the locator used by the sequencer.
    pub fn use_locator(&mut self, locator: ConfigLocator) {
        self.locator = locator;
    }

    /// Runs the startup sequence once.
    pub fn run(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let context = self
            .context
            .clone()
            .expect("a deployment must be selected before running");
        let sequencer = InitializationSequencer::new(
            self.locator.clone(),
            self.collaborators.collaborators(),
            self.reporter.clone(),
        );
        self.outcome = Some(sequencer.run(&self.environment, &context));
    }

    /// Outcome of the last run.
    #[must_use]
    pub fn outcome(&self) -> &InitOutcome {
        self.outcome.as_ref().expect("sequence has not run")
    }

    /// Ledger messages recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<String> {
        self.environment.ledger().all()
    }

    /// Number of ledger messages containing `needle`.
    #[must_use]
    pub fn diagnostics_mentioning(&self, needle: &str) -> usize {
        self.diagnostics()
            .iter()
            .filter(|message| message.contains(needle))
            .count()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
