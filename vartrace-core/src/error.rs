//! Error types for vartrace operations
//!
//! Every failure in a trace is structural (a bad suite definition, a scheme
//! without metadata, a malformed metadata file) and ends the invocation. The
//! variants carry their context as fields rather than pre-formatted text so
//! callers can branch on [`ErrorKind`] and still print a useful message.
//!
//! A variable that a scheme does not declare is *not* an error; it is a normal
//! outcome recorded in the usage report.
//!
//! # Example
//!
//! ```rust
//! use vartrace_core::error::{ErrorKind, TrackError};
//!
//! fn handle_error(err: TrackError) {
//!     match err.kind() {
//!         ErrorKind::Config => println!("check the command line and config files"),
//!         ErrorKind::Lookup => println!("suite and metadata directory disagree"),
//!         ErrorKind::MetadataParse => println!("fix the metadata file"),
//!     }
//!     std::process::exit(err.exit_code());
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for vartrace operations
pub type Result<T> = std::result::Result<T, TrackError>;

/// Closed set of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Command line, suite definition or prebuild configuration is unusable
    Config,
    /// A scheme or the metadata directory could not be found
    Lookup,
    /// A metadata file could not be read or parsed
    MetadataParse,
}

/// Errors that can occur while tracing a variable through a suite
#[derive(Error, Debug)]
pub enum TrackError {
    // ═══════════════════════════════════════════════════════════════════════
    // Configuration errors
    // ═══════════════════════════════════════════════════════════════════════

    /// A command line argument is missing or unusable
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Suite definition file is missing or malformed
    #[error("Parsing suite definition file {} failed: {reason}", .path.display())]
    SuiteDefinition { path: PathBuf, reason: String },

    /// Prebuild configuration file is missing or malformed
    #[error("Importing prebuild config {} failed: {reason}", .path.display())]
    PrebuildConfig { path: PathBuf, reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Lookup errors
    // ═══════════════════════════════════════════════════════════════════════

    /// The metadata directory could not be enumerated or holds no metadata
    #[error("Scanning metadata directory {} failed: {reason}", .path.display())]
    MetadataDirectory { path: PathBuf, reason: String },

    /// A scheme in the call tree has no metadata file in the index
    #[error(
        "Scheme '{scheme}' from suite '{suite}' not found in metadata files in {} (tracing variable '{variable}')",
        .metadata_path.display()
    )]
    SchemeNotFound {
        scheme: String,
        suite: String,
        variable: String,
        metadata_path: PathBuf,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Metadata errors
    // ═══════════════════════════════════════════════════════════════════════

    /// A metadata file could not be read
    #[error("Reading metadata file {} failed: {reason}", .path.display())]
    MetadataRead { path: PathBuf, reason: String },

    /// A metadata file is malformed
    #[error("Parsing metadata file {} failed at line {line}: {reason}", .path.display())]
    MetadataParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl TrackError {
    pub(crate) fn suite_definition<S: Into<String>>(path: &Path, reason: S) -> Self {
        TrackError::SuiteDefinition {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn prebuild_config<S: Into<String>>(path: &Path, reason: S) -> Self {
        TrackError::PrebuildConfig {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn metadata_read<S: Into<String>>(path: &Path, reason: S) -> Self {
        TrackError::MetadataRead {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackError::InvalidArgument { .. }
            | TrackError::SuiteDefinition { .. }
            | TrackError::PrebuildConfig { .. } => ErrorKind::Config,

            TrackError::MetadataDirectory { .. } | TrackError::SchemeNotFound { .. } => {
                ErrorKind::Lookup
            }

            TrackError::MetadataRead { .. } | TrackError::MetadataParse { .. } => {
                ErrorKind::MetadataParse
            }
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            TrackError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            TrackError::SuiteDefinition { .. } => "SUITE_DEFINITION",
            TrackError::PrebuildConfig { .. } => "PREBUILD_CONFIG",
            TrackError::MetadataDirectory { .. } => "METADATA_DIRECTORY",
            TrackError::SchemeNotFound { .. } => "SCHEME_NOT_FOUND",
            TrackError::MetadataRead { .. } => "METADATA_READ",
            TrackError::MetadataParse { .. } => "METADATA_PARSE",
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Config => 2,
            ErrorKind::Lookup => 3,
            ErrorKind::MetadataParse => 4,
        }
    }
}
