//! Temporary deployment directories populated with properties files.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use oai_config::{DB_PROPERTIES, DIRECTORY_PROPERTIES, LOGGING_PROPERTIES, SERVER_PROPERTIES};

/// A throwaway deployment rooted in a temporary directory.
pub struct Layout {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Layout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        Self { _temp: temp, root }
    }

    /// Path below the root, not created.
    #[must_use]
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Directory below the root, created on demand.
    #[must_use]
    pub fn dir(&self, relative: &str) -> Utf8PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).expect("create layout directory");
        path
    }

    /// Writes `name` into `dir` as `key=value` lines.
    pub fn write_properties(&self, dir: &Utf8Path, name: &str, entries: &[(&str, &str)]) {
        let contents: String = entries
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();
        fs::create_dir_all(dir).expect("create properties directory");
        fs::write(dir.join(name), contents).expect("write properties file");
    }

    /// Writes database properties into `dir`.
    pub fn write_db_properties(&self, dir: &Utf8Path) {
        self.write_properties(
            dir,
            DB_PROPERTIES,
            &[
                ("url", "jdbc:mysql://localhost:3306/oai"),
                ("user", "oai"),
            ],
        );
    }

    /// Writes logging properties into `dir`.
    pub fn write_logging_properties(&self, dir: &Utf8Path) {
        self.write_properties(dir, LOGGING_PROPERTIES, &[("log.filter", "debug")]);
    }

    /// Writes server properties selecting `storage_type` into `dir`.
    pub fn write_server_properties(&self, dir: &Utf8Path, storage_type: &str) {
        self.write_properties(dir, SERVER_PROPERTIES, &[("storageType", storage_type)]);
    }

    /// Writes directory properties into `dir`.
    pub fn write_directory_properties(&self, dir: &Utf8Path, entries: &[(&str, &str)]) {
        self.write_properties(dir, DIRECTORY_PROPERTIES, entries);
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}
