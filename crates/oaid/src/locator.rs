//! Resolution of named configuration resources.
//!
//! A resource is looked up first among the resources packaged into the
//! binary, then as a file under each candidate directory in the order the
//! caller supplies them. The first hit wins. Failed lookups are never cached,
//! so a later call sees files that appeared in the meantime.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use oai_config::{Properties, PropertiesError};
use thiserror::Error;

const LOCATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::locator");

/// Source of resources compiled into the binary.
pub trait EmbeddedResources: Send + Sync {
    /// Returns the contents of the named resource, when packaged.
    fn get(&self, name: &str) -> Option<&str>;
}

/// Static table of packaged resources.
#[derive(Debug, Clone, Default)]
pub struct PackagedResources {
    entries: BTreeMap<&'static str, &'static str>,
}

impl PackagedResources {
    /// Builds a bundle with no resources, so every lookup falls through to
    /// the filesystem.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a bundle from `(name, contents)` pairs.
    #[must_use]
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, &'static str)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl EmbeddedResources for PackagedResources {
    fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).copied()
    }
}

/// Where a resolved resource came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOrigin {
    /// A resource packaged into the binary.
    Embedded,
    /// A file on disk.
    File {
        /// Path the file was read from.
        path: PathBuf,
    },
}

impl fmt::Display for ResourceOrigin {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => formatter.write_str("embedded"),
            Self::File { path } => write!(formatter, "{}", path.display()),
        }
    }
}

/// A loaded properties resource together with its origin.
///
/// Values are read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    name: String,
    origin: ResourceOrigin,
    properties: Properties,
}

impl ResolvedConfig {
    /// Builds a resolved resource from already parsed properties.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: ResourceOrigin, properties: Properties) -> Self {
        Self {
            name: name.into(),
            origin,
            properties,
        }
    }

    /// Resource name that was requested.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Where the resource was found.
    #[must_use]
    pub fn origin(&self) -> &ResourceOrigin {
        &self.origin
    }

    /// Path of the backing file, for file-based resources.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            ResourceOrigin::Embedded => None,
            ResourceOrigin::File { path } => Some(path.as_path()),
        }
    }

    /// Parsed key/value pairs.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

/// Errors raised while locating a resource.
#[derive(Debug, Error)]
pub enum LocateError {
    /// No location held the resource.
    #[error("configuration resource '{name}' not found (searched: {})", .searched.join(", "))]
    NotFound {
        /// Requested resource name.
        name: String,
        /// Every location that was tried, in order.
        searched: Vec<String>,
    },
    /// The resource exists but could not be read.
    #[error("failed to read configuration resource '{}': {source}", .path.display())]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The resource was read but is not a valid properties document.
    #[error("configuration resource '{name}' from {origin} is malformed: {source}")]
    Parse {
        /// Requested resource name.
        name: String,
        /// Where the malformed content came from.
        origin: ResourceOrigin,
        /// Underlying parse error.
        #[source]
        source: PropertiesError,
    },
}

impl LocateError {
    /// Returns `true` when the resource simply does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Bounded retry applied when a resource is not found.
///
/// The default performs a single attempt so misconfiguration is reported
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Up to `attempts` lookups separated by `delay`. Zero is treated as one.
    #[must_use]
    pub const fn bounded(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            delay,
        }
    }

    /// Total number of lookups performed before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Resolves configuration resources through the embedded-then-filesystem
/// search chain.
#[derive(Clone)]
pub struct ConfigLocator {
    embedded: Arc<dyn EmbeddedResources>,
    retry: RetryPolicy,
}

impl fmt::Debug for ConfigLocator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConfigLocator")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigLocator {
    fn default() -> Self {
        Self::new(Arc::new(PackagedResources::empty()))
    }
}

impl ConfigLocator {
    /// Builds a locator over the supplied embedded resources.
    #[must_use]
    pub fn new(embedded: Arc<dyn EmbeddedResources>) -> Self {
        Self {
            embedded,
            retry: RetryPolicy::none(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolves `name`, trying the embedded resources and then each
    /// candidate directory in order.
    pub fn resolve<I, P>(&self, name: &str, candidates: I) -> Result<ResolvedConfig, LocateError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let candidates: Vec<PathBuf> = candidates
            .into_iter()
            .map(|dir| dir.as_ref().to_path_buf())
            .collect();
        let mut attempt = 1;
        loop {
            match self.resolve_once(name, &candidates) {
                Err(error) if error.is_not_found() && attempt < self.retry.attempts => {
                    tracing::debug!(
                        target: LOCATOR_TARGET,
                        resource = name,
                        attempt,
                        "resource not found, retrying"
                    );
                    attempt += 1;
                    thread::sleep(self.retry.delay);
                }
                result => return result,
            }
        }
    }

    fn resolve_once(
        &self,
        name: &str,
        candidates: &[PathBuf],
    ) -> Result<ResolvedConfig, LocateError> {
        if let Some(contents) = self.embedded.get(name) {
            tracing::debug!(target: LOCATOR_TARGET, resource = name, "using embedded resource");
            return parse(name, ResourceOrigin::Embedded, contents);
        }

        let mut searched = vec![format!("embedded:{name}")];
        for dir in candidates {
            let path = dir.join(name);
            if !path.is_file() {
                searched.push(path.display().to_string());
                continue;
            }
            let contents = fs::read_to_string(&path).map_err(|source| LocateError::Read {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(
                target: LOCATOR_TARGET,
                resource = name,
                path = %path.display(),
                "using resource file"
            );
            return parse(name, ResourceOrigin::File { path }, &contents);
        }

        Err(LocateError::NotFound {
            name: name.to_owned(),
            searched,
        })
    }
}

fn parse(name: &str, origin: ResourceOrigin, contents: &str) -> Result<ResolvedConfig, LocateError> {
    match Properties::parse(contents) {
        Ok(properties) => Ok(ResolvedConfig::new(name, origin, properties)),
        Err(source) => Err(LocateError::Parse {
            name: name.to_owned(),
            origin,
            source,
        }),
    }
}
