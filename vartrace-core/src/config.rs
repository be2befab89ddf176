//! Invocation configuration
//!
//! [`TrackConfig`] is the explicit value the driver receives instead of a
//! process-wide argument object. [`PrebuildConfig`] is the JSON rendition of
//! the CCPP prebuild configuration; only the keys the tracer consults are
//! modelled.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// Everything one invocation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackConfig {
    /// Suite definition file
    pub sdf: PathBuf,
    /// Directory holding the scheme `.meta` files
    pub metadata_path: PathBuf,
    /// Prebuild configuration file
    pub config: PathBuf,
    /// Standard name to trace
    pub variable: String,
    /// Verbose diagnostics; no effect on matching
    pub debug: bool,
}

impl TrackConfig {
    pub fn new(
        sdf: impl Into<PathBuf>,
        metadata_path: impl Into<PathBuf>,
        config: impl Into<PathBuf>,
        variable: impl Into<String>,
    ) -> Self {
        Self {
            sdf: sdf.into(),
            metadata_path: metadata_path.into(),
            config: config.into(),
            variable: variable.into(),
            debug: false,
        }
    }

    /// Enable debug output
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reject values no trace can work with
    pub fn validate(&self) -> Result<()> {
        if self.variable.trim().is_empty() {
            return Err(TrackError::InvalidArgument {
                argument: "variable".to_string(),
                reason: "standard name must not be empty".to_string(),
            });
        }
        if self.variable.chars().any(char::is_whitespace) {
            return Err(TrackError::InvalidArgument {
                argument: "variable".to_string(),
                reason: format!("standard name '{}' contains whitespace", self.variable),
            });
        }
        Ok(())
    }
}

/// `scheme_files` comes either as a plain list or keyed by source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemeFiles {
    List(Vec<String>),
    /// Source file -> sets the scheme belongs to
    Map(BTreeMap<String, Vec<String>>),
}

impl SchemeFiles {
    /// Source file paths in declaration order
    pub fn paths(&self) -> Vec<&str> {
        match self {
            SchemeFiles::List(paths) => paths.iter().map(String::as_str).collect(),
            SchemeFiles::Map(paths) => paths.keys().map(String::as_str).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SchemeFiles::List(paths) => paths.len(),
            SchemeFiles::Map(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// CCPP prebuild configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrebuildConfig {
    #[serde(alias = "SCHEME_FILES")]
    pub scheme_files: SchemeFiles,

    /// Host model source files whose `.meta` companions declare host variables
    #[serde(default, alias = "VARIABLE_DEFINITION_FILES")]
    pub variable_definition_files: Vec<String>,

    #[serde(default, alias = "TYPEDEFS_NEW_METADATA")]
    pub typedefs_new_metadata: BTreeMap<String, BTreeMap<String, String>>,

    /// Directory of the file this was loaded from, used to resolve relative paths
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl PrebuildConfig {
    /// Load a prebuild configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| TrackError::prebuild_config(path, e.to_string()))?;

        let mut config = Self::from_json(&content)
            .map_err(|e| TrackError::prebuild_config(path, e.to_string()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        tracing::debug!(
            scheme_files = config.scheme_files.len(),
            variable_definition_files = config.variable_definition_files.len(),
            typedefs = config.typedefs_new_metadata.len(),
            "loaded prebuild config {}",
            path.display()
        );

        Ok(config)
    }

    /// Parse a prebuild configuration from a JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolve a path from the config against the config's directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Whether a metadata file corresponds to one of the configured scheme sources
    ///
    /// Sources and metadata share a file stem (`scheme_a.F90` / `scheme_a.meta`).
    pub fn declares_scheme_file(&self, metadata_file: &Path) -> bool {
        let Some(stem) = metadata_file.file_stem() else {
            return false;
        };
        self.scheme_files
            .paths()
            .iter()
            .any(|source| Path::new(source).file_stem() == Some(stem))
    }
}
