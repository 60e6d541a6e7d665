//! The on-disk directory holding cached request artefacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// A validated cache directory.
///
/// Only obtainable through [`CacheDirectory::prepare`], so holding one means
/// the path existed as a directory at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirectory {
    path: PathBuf,
}

/// Result of validating the configured cache path.
#[derive(Debug)]
pub enum CachePreparation {
    /// The directory already existed.
    Existing(CacheDirectory),
    /// The directory was missing and has been created.
    Created(CacheDirectory),
    /// The directory was missing and could not be created.
    CreateFailed {
        /// Configured path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Something other than a directory occupies the path.
    NotADirectory {
        /// Configured path.
        path: PathBuf,
    },
}

impl CacheDirectory {
    /// Validates `path`, creating it when it does not exist yet.
    #[must_use]
    pub fn prepare(path: &Path) -> CachePreparation {
        if !path.exists() {
            return match fs::create_dir_all(path) {
                Ok(()) => CachePreparation::Created(Self {
                    path: path.to_path_buf(),
                }),
                Err(source) => CachePreparation::CreateFailed {
                    path: path.to_path_buf(),
                    source,
                },
            };
        }
        if path.is_dir() {
            CachePreparation::Existing(Self {
                path: path.to_path_buf(),
            })
        } else {
            CachePreparation::NotADirectory {
                path: path.to_path_buf(),
            }
        }
    }

    /// The directory itself.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// File holding the artefact for `fingerprint`.
    ///
    /// Fingerprints are hashed so arbitrary request strings map to safe,
    /// fixed-length file names.
    #[must_use]
    pub fn artifact_path(&self, fingerprint: &str) -> PathBuf {
        self.path
            .join(hex::encode(Sha256::digest(fingerprint.as_bytes())))
    }

    /// Deletes the artefact for `fingerprint`, returning whether a file was
    /// removed.
    pub fn remove_artifact(&self, fingerprint: &str) -> io::Result<bool> {
        match fs::remove_file(self.artifact_path(fingerprint)) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error),
        }
    }
}
