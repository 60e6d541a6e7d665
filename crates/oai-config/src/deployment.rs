//! Deployment contexts and their normalisation to one directory triple.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Where the server runs and how it was told to find its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeploymentContext {
    /// Command-line use with one directory for logs and configuration.
    Standalone {
        /// Directory holding both the log output and the properties files.
        log_dir: Utf8PathBuf,
    },
    /// Command-line use with separate configuration and log directories.
    StandaloneWithRoot {
        /// Directory holding the properties files.
        root_dir: Utf8PathBuf,
        /// Directory receiving log output.
        log_dir: Utf8PathBuf,
    },
    /// Hosted inside a servlet-style container.
    Hosted {
        /// The container's binary or installation directory.
        bin_dir: Utf8PathBuf,
    },
}

impl DeploymentContext {
    /// Reduces the context to the directories consumed by the startup
    /// sequence.
    #[must_use]
    pub fn normalize(&self) -> SequenceDirs {
        match self {
            Self::Standalone { log_dir } => SequenceDirs {
                log_base: Some(log_dir.clone()),
                db_base: log_dir.clone(),
                app_base: log_dir.clone(),
                container_dir: None,
            },
            Self::StandaloneWithRoot { root_dir, log_dir } => SequenceDirs {
                log_base: Some(log_dir.clone()),
                db_base: root_dir.clone(),
                app_base: root_dir.clone(),
                container_dir: None,
            },
            Self::Hosted { bin_dir } => SequenceDirs {
                log_base: None,
                db_base: bin_dir.clone(),
                app_base: bin_dir.clone(),
                container_dir: Some(bin_dir.clone()),
            },
        }
    }

    /// Short label used in telemetry.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Standalone { .. } => "standalone",
            Self::StandaloneWithRoot { .. } => "standalone_with_root",
            Self::Hosted { .. } => "hosted",
        }
    }
}

/// Normalised directories for the startup sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDirs {
    /// Log output directory. `None` defers to `logDir` from the directory
    /// properties.
    pub log_base: Option<Utf8PathBuf>,
    /// Base directory for the database properties.
    pub db_base: Utf8PathBuf,
    /// Base directory for the server, logging and directory properties.
    pub app_base: Utf8PathBuf,
    /// Container-supplied directory, searched before every other base.
    pub container_dir: Option<Utf8PathBuf>,
}

impl SequenceDirs {
    /// Candidate directories for the database properties, container first.
    #[must_use]
    pub fn db_candidates(&self) -> Vec<&Utf8Path> {
        candidates(self.container_dir.as_deref(), &self.db_base)
    }

    /// Candidate directories for the application-level properties.
    #[must_use]
    pub fn app_candidates(&self) -> Vec<&Utf8Path> {
        candidates(self.container_dir.as_deref(), &self.app_base)
    }
}

fn candidates<'a>(container: Option<&'a Utf8Path>, base: &'a Utf8Path) -> Vec<&'a Utf8Path> {
    let mut dirs = Vec::with_capacity(2);
    if let Some(container) = container {
        dirs.push(container);
    }
    if !dirs.contains(&base) {
        dirs.push(base);
    }
    dirs
}
