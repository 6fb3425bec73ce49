//! Document loading
//!
//! The three source documents load independently and in any order; a failed
//! source is reported on its own and never corrupts what the other two put
//! into the catalogue. There is no automatic retry; the caller decides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use super::{BindingDoc, BoardDoc, Catalogue, DeviceDoc};
use crate::error::Error;

/// Which of the three source documents an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Devices,
    Boards,
    Bindings,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Devices => "devices",
            SourceKind::Boards => "boards",
            SourceKind::Bindings => "bindings",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the loader finds the three documents. Passed in explicitly at
/// construction; there is no ambient default location.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    pub devices: PathBuf,
    pub boards: PathBuf,
    pub bindings: PathBuf,
}

impl LoaderConfig {
    /// Conventional layout: `<dir>/devices.json`, `<dir>/boards.json`,
    /// `<dir>/bindings.json`.
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            devices: dir.join("devices.json"),
            boards: dir.join("boards.json"),
            bindings: dir.join("bindings.json"),
        }
    }

    /// Read a `[sources]` table from a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let file: ConfigFile = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(file.sources)
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    sources: LoaderConfig,
}

/// Outcome of one load pass: the (possibly partially) populated catalogue
/// and the per-source failures.
#[derive(Debug)]
pub struct LoadReport {
    pub catalogue: Catalogue,
    pub failures: Vec<Error>,
}

/// Loads the three documents from files named by a [`LoaderConfig`].
#[derive(Debug)]
pub struct FileLoader {
    config: LoaderConfig,
}

impl FileLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load all three sources. Each source either populates the catalogue or
    /// contributes one `LoadFailure` to the report.
    pub fn load_all(&self) -> LoadReport {
        let mut catalogue = Catalogue::new();
        let mut failures = Vec::new();

        match self.load_one::<DeviceDoc>(SourceKind::Devices, &self.config.devices) {
            Ok(doc) => catalogue.insert_devices(doc),
            Err(e) => failures.push(e),
        }
        match self.load_one::<BoardDoc>(SourceKind::Boards, &self.config.boards) {
            Ok(doc) => catalogue.insert_boards(doc),
            Err(e) => failures.push(e),
        }
        match self.load_one::<BindingDoc>(SourceKind::Bindings, &self.config.bindings) {
            Ok(doc) => catalogue.insert_bindings(doc),
            Err(e) => failures.push(e),
        }

        LoadReport {
            catalogue,
            failures,
        }
    }

    fn load_one<T: serde::de::DeserializeOwned>(
        &self,
        kind: SourceKind,
        path: &Path,
    ) -> Result<T, Error> {
        let load = || -> Result<T, String> {
            let contents = fs::read_to_string(path).map_err(|e| e.to_string())?;
            serde_json::from_str(&contents).map_err(|e| e.to_string())
        };
        match load() {
            Ok(doc) => {
                info!(kind = kind.as_str(), path = %path.display(), "loaded document");
                Ok(doc)
            }
            Err(reason) => {
                error!(kind = kind.as_str(), path = %path.display(), reason = %reason, "load failed");
                Err(Error::LoadFailure { kind, reason })
            }
        }
    }
}
