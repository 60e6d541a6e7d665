//! Shared fixtures for the bootstrap test suites.

mod collaborators;
mod layout;
mod reporter;
mod world;

pub use collaborators::{CollaboratorCall, FailurePoint, RecordingCollaborators};
pub use layout::Layout;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
