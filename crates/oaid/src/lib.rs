//! Bootstrap core of the OAI harvesting server.
//!
//! The server reads a small family of `.properties` resources (see
//! [`oai_config`]) and brings its subsystems up in a fixed order: logging,
//! persistence, application directories, the optional full-text search index,
//! metadata formats and finally the set cache. [`InitializationSequencer`]
//! runs those steps once against an [`Environment`], the service object that
//! owns all process-wide state, and publishes an [`InitOutcome`] through a
//! one-shot ready gate.
//!
//! Failures are classified rather than swallowed. Problems that leave the
//! server usable with reduced functionality, such as a missing cache
//! directory or an unattachable search index, are appended to the
//! [`ErrorLedger`] and turn the outcome into [`InitOutcome::DegradedReady`].
//! Problems that make serving pointless, such as missing database properties,
//! stop the sequence with [`InitOutcome::Failed`].
//!
//! After startup, request-serving threads obtain a [`ReadyEnvironment`] via
//! [`Environment::await_ready`] and use the [`SetCache`] and the
//! [`RequestCacheRegister`]; [`ReadyEnvironment::sweep_cache`] is the
//! rate-limited eviction trigger run before each request.
//!
//! The persistence layer, search index, metadata-format loader and logging
//! backend sit behind the traits in the collaborators module so that the
//! sequence can be driven with test doubles.

mod bootstrap;
mod cache_directory;
mod collaborators;
mod eviction;
mod gate;
mod health;
mod launch;
mod ledger;
mod locator;
mod outcome;
mod placeholder;
mod request_cache;
mod set_cache;
mod telemetry;

pub use bootstrap::{
    AppSettings, Environment, InitializationSequencer, ReadyEnvironment, ReadyError,
};
pub use cache_directory::{CacheDirectory, CachePreparation};
pub use collaborators::{
    CollaboratorError, CollaboratorKind, Collaborators, LoggingSink, MetadataFormatLoader,
    Persistence, SearchIndex,
};
pub use eviction::{CacheEvictionPolicy, EvictionClock, SweepOutcome, SweepReport};
pub use gate::{GateError, ReadyGate};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use launch::{LaunchError, Startup, run_server, run_server_with, write_summary};
pub use ledger::{ErrorLedger, LedgerEntry, Severity};
pub use locator::{
    ConfigLocator, EmbeddedResources, LocateError, PackagedResources, ResolvedConfig,
    ResourceOrigin, RetryPolicy,
};
pub use outcome::{InitError, InitOutcome, SequenceState};
pub use request_cache::{CacheRequestEntry, RegisterError, RequestCacheRegister, RequestState};
pub use set_cache::{SetCache, SetCacheError, SetLookupError, SetRecord};
pub use telemetry::{TelemetryError, TelemetryHandle, TracingLoggingSink};

#[cfg(test)]
mod tests;
