//! Server bootstrap orchestration.
//!
//! [`Environment`] owns every piece of process-wide state. The
//! [`InitializationSequencer`] fills it in one strictly ordered pass and
//! publishes the outcome through the ready gate; request-serving code obtains
//! a [`ReadyEnvironment`] view only once that outcome is known and usable.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use once_cell::sync::OnceCell;
use thiserror::Error;

use oai_config::{
    CACHE_DIR_KEY, DB_PROPERTIES, DIRECTORY_PROPERTIES, DeploymentContext, DirectorySettings,
    LOGGING_PROPERTIES, LUCENE_DIR_KEY, METADATA_FORMAT_MAPPING_FILE, METADATA_FORMATS_FILE,
    SERVER_PROPERTIES, SequenceDirs, ServerSettings,
};

use crate::cache_directory::{CacheDirectory, CachePreparation};
use crate::collaborators::Collaborators;
use crate::eviction::{CacheEvictionPolicy, SweepOutcome};
use crate::gate::{GateError, ReadyGate};
use crate::health::HealthReporter;
use crate::ledger::ErrorLedger;
use crate::locator::{ConfigLocator, LocateError, ResolvedConfig};
use crate::outcome::{InitError, InitOutcome, SequenceState};
use crate::request_cache::RequestCacheRegister;
use crate::set_cache::SetCache;

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Application settings gathered during startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    deployment: DeploymentContext,
    directories: DirectorySettings,
    server: ServerSettings,
    log_dir: Option<PathBuf>,
    cache_directory: Option<CacheDirectory>,
    search_index: Option<PathBuf>,
}

impl AppSettings {
    /// Deployment the server was started in.
    #[must_use]
    pub fn deployment(&self) -> &DeploymentContext {
        &self.deployment
    }

    /// Values read from the directory properties. Empty when the resource
    /// was unavailable.
    #[must_use]
    pub fn directories(&self) -> &DirectorySettings {
        &self.directories
    }

    /// Values read from the server properties.
    #[must_use]
    pub fn server(&self) -> &ServerSettings {
        &self.server
    }

    /// Directory receiving log output, when one is known.
    #[must_use]
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// Validated cache directory. `None` means caching is disabled.
    #[must_use]
    pub fn cache_directory(&self) -> Option<&CacheDirectory> {
        self.cache_directory.as_ref()
    }

    /// Directory of the attached search index.
    #[must_use]
    pub fn search_index(&self) -> Option<&Path> {
        self.search_index.as_deref()
    }
}

/// Reasons a ready view cannot be handed out.
#[derive(Debug, Error)]
pub enum ReadyError {
    /// Startup has not finished yet.
    #[error("server initialisation has not completed")]
    Pending,
    /// Startup failed; request serving must not start.
    #[error("server initialisation failed after {state}: {source}")]
    Failed {
        /// State reached before the failing step.
        state: SequenceState,
        /// Cause of the failure.
        #[source]
        source: Arc<InitError>,
    },
    /// Waiting on the gate failed.
    #[error(transparent)]
    Gate(#[from] GateError),
}

/// Process-wide state of the server.
///
/// Created empty by the entry point, filled by one
/// [`InitializationSequencer`] run and then shared by `Arc` with
/// request-serving threads.
#[derive(Debug, Default)]
pub struct Environment {
    ledger: ErrorLedger,
    sets: SetCache,
    register: RequestCacheRegister,
    eviction: CacheEvictionPolicy,
    gate: ReadyGate,
    settings: OnceCell<AppSettings>,
    started: AtomicBool,
}

impl Environment {
    /// Builds an empty environment with the default eviction policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the eviction policy.
    #[must_use]
    pub fn with_eviction_policy(mut self, eviction: CacheEvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Diagnostics recorded so far. Readable at any time.
    #[must_use]
    pub fn ledger(&self) -> &ErrorLedger {
        &self.ledger
    }

    /// The published outcome, if startup has finished.
    #[must_use]
    pub fn outcome(&self) -> Option<InitOutcome> {
        self.gate.outcome()
    }

    /// Blocks until startup finishes and returns the ready view.
    pub fn await_ready(&self) -> Result<ReadyEnvironment<'_>, ReadyError> {
        self.ready_view(self.gate.wait())
    }

    /// Like [`Environment::await_ready`], giving up after `timeout`.
    pub fn await_ready_timeout(
        &self,
        timeout: Duration,
    ) -> Result<ReadyEnvironment<'_>, ReadyError> {
        self.ready_view(self.gate.wait_timeout(timeout)?)
    }

    /// Returns the ready view without blocking.
    pub fn try_ready(&self) -> Result<ReadyEnvironment<'_>, ReadyError> {
        self.ready_view(self.gate.outcome().ok_or(ReadyError::Pending)?)
    }

    fn ready_view(&self, outcome: InitOutcome) -> Result<ReadyEnvironment<'_>, ReadyError> {
        if let InitOutcome::Failed { state, error } = outcome {
            return Err(ReadyError::Failed {
                state,
                source: error,
            });
        }
        let settings = self.settings.get().ok_or(ReadyError::Pending)?;
        Ok(ReadyEnvironment {
            environment: self,
            settings,
            outcome,
        })
    }
}

/// Read access to a successfully started environment.
#[derive(Debug, Clone)]
pub struct ReadyEnvironment<'env> {
    environment: &'env Environment,
    settings: &'env AppSettings,
    outcome: InitOutcome,
}

impl<'env> ReadyEnvironment<'env> {
    /// `FullyReady` or `DegradedReady`.
    #[must_use]
    pub fn outcome(&self) -> &InitOutcome {
        &self.outcome
    }

    /// Settings gathered during startup.
    #[must_use]
    pub fn settings(&self) -> &'env AppSettings {
        self.settings
    }

    /// The populated set cache.
    #[must_use]
    pub fn sets(&self) -> &'env SetCache {
        &self.environment.sets
    }

    /// The request cache register.
    #[must_use]
    pub fn register(&self) -> &'env RequestCacheRegister {
        &self.environment.register
    }

    /// The diagnostics ledger.
    #[must_use]
    pub fn ledger(&self) -> &'env ErrorLedger {
        &self.environment.ledger
    }

    /// The cache directory, absent when caching is disabled.
    #[must_use]
    pub fn cache_directory(&self) -> Option<&'env CacheDirectory> {
        self.settings.cache_directory()
    }

    /// Pre-request eviction trigger; sweeps at most once per interval.
    pub fn sweep_cache(&self, now: Instant) -> SweepOutcome {
        let eviction = &self.environment.eviction;
        match self.cache_directory() {
            Some(cache) => eviction.sweep_with(self.register(), cache, now),
            None => eviction.maybe_sweep(self.register(), now),
        }
    }
}

/// Runs the startup steps against an [`Environment`].
pub struct InitializationSequencer {
    locator: ConfigLocator,
    collaborators: Collaborators,
    reporter: Arc<dyn HealthReporter>,
}

impl std::fmt::Debug for InitializationSequencer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("InitializationSequencer")
            .field("locator", &self.locator)
            .field("collaborators", &self.collaborators)
            .finish_non_exhaustive()
    }
}

impl InitializationSequencer {
    /// Builds a sequencer from its collaborators.
    #[must_use]
    pub fn new(
        locator: ConfigLocator,
        collaborators: Collaborators,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            locator,
            collaborators,
            reporter,
        }
    }

    /// Runs every step for `context`, publishes the outcome to the
    /// environment's ready gate and returns it.
    ///
    /// An environment accepts one run. Later calls return a failed outcome
    /// carrying [`InitError::AlreadyInitialized`] and leave the published
    /// outcome untouched.
    pub fn run(&self, environment: &Environment, context: &DeploymentContext) -> InitOutcome {
        if environment.started.swap(true, Ordering::AcqRel) {
            let error = InitError::AlreadyInitialized;
            self.reporter
                .sequence_failed(SequenceState::NotStarted, &error);
            return InitOutcome::Failed {
                state: SequenceState::NotStarted,
                error: Arc::new(error),
            };
        }

        self.reporter.sequence_starting(context);
        let ledger_mark = environment.ledger.len();
        let mut run = SequenceRun {
            sequencer: self,
            environment,
            dirs: context.normalize(),
            state: SequenceState::NotStarted,
        };

        let outcome = match run.execute(context) {
            Ok(settings) => {
                // Set before publishing so every ready view sees settings.
                if environment.settings.set(settings).is_err() {
                    tracing::error!(
                        target: BOOTSTRAP_TARGET,
                        "application settings were already set"
                    );
                }
                let diagnostics = environment.ledger.entries_since(ledger_mark);
                if diagnostics.is_empty() {
                    InitOutcome::FullyReady
                } else {
                    InitOutcome::DegradedReady { diagnostics }
                }
            }
            Err(error) => run.fail(error),
        };

        if let Err(error) = environment.gate.publish(outcome.clone()) {
            tracing::error!(
                target: BOOTSTRAP_TARGET,
                error = %error,
                "startup outcome could not be published"
            );
        }
        self.reporter.sequence_finished(&outcome);
        outcome
    }
}

struct SequenceRun<'a> {
    sequencer: &'a InitializationSequencer,
    environment: &'a Environment,
    dirs: SequenceDirs,
    state: SequenceState,
}

impl SequenceRun<'_> {
    fn execute(&mut self, context: &DeploymentContext) -> Result<AppSettings, InitError> {
        let directories = self.load_directory_settings();
        let server = self.load_server_settings();

        let log_dir = self
            .dirs
            .log_base
            .clone()
            .or_else(|| directories.as_ref().and_then(|dirs| dirs.log_dir.clone()))
            .map(|dir| dir.into_std_path_buf());
        self.activate_logging(log_dir.as_deref());
        self.advance(SequenceState::LoggingReady)?;

        self.initialise_database()?;
        self.advance(SequenceState::DbReady)?;

        let mut cache_directory = None;
        let mut search_index = None;
        // Without directory properties there is no resourceDir to resolve
        // the descriptors against. Command-line deployments often ship no
        // such file, so this degrades instead of taking the fatal
        // MissingResourceDir path, which only applies once the file exists.
        if let Some(directories) = directories.as_ref() {
            cache_directory = self.prepare_cache_directory(directories);
            if server.storage_type.needs_search_index() {
                search_index = self.attach_search_index(directories)?;
            }
            self.load_metadata_formats(directories)?;
        }

        let sequencer = self.sequencer;
        let count = self
            .environment
            .sets
            .populate(sequencer.collaborators.persistence.as_ref())
            .map_err(|source| InitError::SetCache { source })?;
        tracing::info!(target: BOOTSTRAP_TARGET, sets = count, "set cache populated");
        self.advance(SequenceState::SetsReady)?;

        Ok(AppSettings {
            deployment: context.clone(),
            directories: directories.unwrap_or_default(),
            server,
            log_dir,
            cache_directory,
            search_index,
        })
    }

    fn advance(&mut self, next: SequenceState) -> Result<(), InitError> {
        self.state.advance(next)?;
        self.sequencer.reporter.step_completed(next);
        Ok(())
    }

    fn fail(&mut self, error: InitError) -> InitOutcome {
        let reached = self.state;
        self.sequencer.reporter.sequence_failed(reached, &error);
        if let Err(violation) = self.state.advance(SequenceState::Failed) {
            tracing::error!(target: BOOTSTRAP_TARGET, error = %violation, "failure after completion");
        }
        InitOutcome::Failed {
            state: reached,
            error: Arc::new(error),
        }
    }

    fn ledger(&self) -> &ErrorLedger {
        &self.environment.ledger
    }

    fn resolve_app(&self, name: &str) -> Result<ResolvedConfig, LocateError> {
        self.sequencer
            .locator
            .resolve(name, self.dirs.app_candidates())
    }

    fn load_directory_settings(&self) -> Option<DirectorySettings> {
        match self.resolve_app(DIRECTORY_PROPERTIES) {
            Ok(config) => Some(DirectorySettings::from_properties(config.properties())),
            Err(error) => {
                self.ledger().record(format!(
                    "{error}; cache, search index and metadata format setup skipped"
                ));
                None
            }
        }
    }

    fn load_server_settings(&self) -> ServerSettings {
        let config = match self.resolve_app(SERVER_PROPERTIES) {
            Ok(config) => config,
            Err(error) if error.is_not_found() => {
                tracing::info!(
                    target: BOOTSTRAP_TARGET,
                    resource = SERVER_PROPERTIES,
                    "no server properties found; using the relational store"
                );
                return ServerSettings::default();
            }
            Err(error) => {
                self.ledger()
                    .record(format!("{error}; using the relational store"));
                return ServerSettings::default();
            }
        };
        ServerSettings::from_properties(config.properties()).unwrap_or_else(|error| {
            self.ledger().record(format!(
                "{error} in {}; using the relational store",
                config.origin()
            ));
            ServerSettings::default()
        })
    }

    fn activate_logging(&self, log_dir: Option<&Path>) {
        match self.resolve_app(LOGGING_PROPERTIES) {
            Ok(config) => {
                if let Err(error) = self
                    .sequencer
                    .collaborators
                    .logging
                    .initialize(&config, log_dir)
                {
                    self.ledger()
                        .record(format!("logging left at defaults: {error}"));
                }
            }
            Err(error) if error.is_not_found() => {
                tracing::info!(
                    target: BOOTSTRAP_TARGET,
                    resource = LOGGING_PROPERTIES,
                    "no logging properties found; logging left at defaults"
                );
            }
            Err(error) => self
                .ledger()
                .record(format!("logging left at defaults: {error}")),
        }
    }

    fn initialise_database(&self) -> Result<(), InitError> {
        let config = self
            .sequencer
            .locator
            .resolve(DB_PROPERTIES, self.dirs.db_candidates())
            .map_err(|source| InitError::ConfigNotFound { source })?;
        tracing::info!(
            target: BOOTSTRAP_TARGET,
            origin = %config.origin(),
            "initialising persistence layer"
        );
        self.sequencer
            .collaborators
            .persistence
            .initialize(&config)
            .map_err(|source| InitError::DbInitFailed { source })
    }

    fn prepare_cache_directory(&self, directories: &DirectorySettings) -> Option<CacheDirectory> {
        let Some(path) = directories.cache_dir.as_deref() else {
            self.ledger().record(format!(
                "'{CACHE_DIR_KEY}' is not set in {DIRECTORY_PROPERTIES}; request caching is disabled"
            ));
            return None;
        };
        match CacheDirectory::prepare(path.as_std_path()) {
            CachePreparation::Existing(dir) => Some(dir),
            CachePreparation::Created(dir) => {
                self.ledger().warn(format!(
                    "cache directory '{path}' did not exist and has been created"
                ));
                Some(dir)
            }
            CachePreparation::CreateFailed { source, .. } => {
                self.ledger().warn(format!(
                    "cache directory '{path}' did not exist and could not be created: {source}; \
                     request caching is disabled"
                ));
                None
            }
            CachePreparation::NotADirectory { .. } => {
                self.ledger().record(format!(
                    "cache path '{path}' is not a directory; request caching is disabled"
                ));
                None
            }
        }
    }

    fn attach_search_index(
        &mut self,
        directories: &DirectorySettings,
    ) -> Result<Option<PathBuf>, InitError> {
        let Some(path) = directories.lucene_dir.as_deref() else {
            self.ledger().record(format!(
                "'{LUCENE_DIR_KEY}' is empty or missing; search index not attached"
            ));
            return Ok(None);
        };
        if !path.exists() {
            let ancestor = nearest_existing_ancestor(path)
                .map_or_else(|| "none".to_owned(), |ancestor| ancestor.to_string());
            self.ledger().record(format!(
                "search index directory '{path}' does not exist (nearest existing ancestor: \
                 {ancestor}); search index not attached"
            ));
            return Ok(None);
        }
        if let Err(error) = self
            .sequencer
            .collaborators
            .search_index
            .attach(path.as_std_path())
        {
            self.ledger().record(format!(
                "search index at '{path}' could not be attached: {error}"
            ));
            return Ok(None);
        }
        self.advance(SequenceState::SearchAttached)?;
        Ok(Some(path.as_std_path().to_path_buf()))
    }

    fn load_metadata_formats(&self, directories: &DirectorySettings) -> Result<(), InitError> {
        let resource_dir = directories
            .resource_dir
            .as_deref()
            .ok_or(InitError::MissingResourceDir)?;
        let formats = resource_dir.join(METADATA_FORMATS_FILE);
        let mapping = resource_dir.join(METADATA_FORMAT_MAPPING_FILE);
        self.sequencer
            .collaborators
            .metadata_formats
            .load(formats.as_std_path(), mapping.as_std_path())
            .map_err(|source| InitError::MetadataFormats { source })
    }
}

/// Closest ancestor of `path` that exists on disk.
fn nearest_existing_ancestor(path: &Utf8Path) -> Option<&Utf8Path> {
    path.ancestors()
        .skip(1)
        .find(|ancestor| !ancestor.as_str().is_empty() && ancestor.exists())
}
