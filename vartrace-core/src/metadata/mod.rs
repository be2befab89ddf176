//! Scheme metadata
//!
//! Each scheme ships a `.meta` file describing the variables its entry points
//! take. A file holds one or more tables; each table holds sections (one per
//! entry point, e.g. `scheme_a_init`, `scheme_a_run`); each section lists its
//! variables in declaration order.
//!
//! ```text
//! [ccpp-table-properties]
//!   name = scheme_a
//!   type = scheme
//!
//! [ccpp-arg-table]
//!   name = scheme_a_run
//!   type = scheme
//! [ ps ]
//!   standard_name = surface_pressure
//!   units = Pa
//!   dimensions = (horizontal_loop_extent)
//!   type = real | kind = kind_phys
//!   intent = in
//! ```
//!
//! Records are plain structs, built once by the parser and never mutated.

mod host;
mod index;
mod parser;

pub use host::{HostDefinition, HostVariables};
pub use index::SchemeFileIndex;
pub use parser::{find_scheme_names, parse_metadata, ParseError};

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// Declared access mode of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    In,
    Out,
    InOut,
}

impl Intent {
    /// Whether the scheme reads the variable
    pub fn reads(self) -> bool {
        matches!(self, Intent::In | Intent::InOut)
    }

    /// Whether the scheme writes the variable
    pub fn writes(self) -> bool {
        matches!(self, Intent::Out | Intent::InOut)
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(Intent::In),
            "out" => Ok(Intent::Out),
            "inout" => Ok(Intent::InOut),
            other => Err(format!("invalid intent '{}', expected in, out or inout", other)),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::In => write!(f, "in"),
            Intent::Out => write!(f, "out"),
            Intent::InOut => write!(f, "inout"),
        }
    }
}

/// One declared variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRecord {
    /// Name inside the scheme's source (the `[ name ]` header)
    pub local_name: String,

    /// Cross-scheme identity of the variable
    pub standard_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub var_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Absent for host-model and type tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,

    #[serde(default)]
    pub optional: bool,

    /// Properties without a dedicated field
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl VariableRecord {
    /// A variable with only the identity fields set
    pub fn new(local_name: impl Into<String>, standard_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            standard_name: standard_name.into(),
            long_name: None,
            units: None,
            dimensions: vec![],
            var_type: None,
            kind: None,
            intent: None,
            optional: false,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }
}

/// One `[ccpp-arg-table]`: the argument list of a single entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSection {
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: String,
    pub variables: Vec<VariableRecord>,
}

impl MetadataSection {
    pub fn new(title: impl Into<String>, section_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            section_type: section_type.into(),
            variables: vec![],
        }
    }

    pub fn with_variable(mut self, variable: VariableRecord) -> Self {
        self.variables.push(variable);
        self
    }

    /// Variables in declaration order
    pub fn variable_list(&self) -> &[VariableRecord] {
        &self.variables
    }
}

/// One `[ccpp-table-properties]` block and the sections that follow it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTable {
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    pub sections: Vec<MetadataSection>,
}

impl MetadataTable {
    pub fn new(name: impl Into<String>, table_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_type: table_type.into(),
            dependencies: vec![],
            sections: vec![],
        }
    }

    pub fn with_section(mut self, section: MetadataSection) -> Self {
        self.sections.push(section);
        self
    }

    /// Sections in declaration order
    pub fn sections(&self) -> &[MetadataSection] {
        &self.sections
    }

    pub fn is_scheme(&self) -> bool {
        self.table_type == "scheme"
    }
}

/// Loads the metadata tables declared for a scheme
pub trait MetadataResolver {
    /// Parse the tables in `path`, the file the index maps `scheme` to
    fn resolve(&self, scheme: &str, path: &Path) -> Result<Vec<MetadataTable>>;
}

/// Reads metadata straight from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetadataResolver;

impl MetadataResolver for FileMetadataResolver {
    fn resolve(&self, scheme: &str, path: &Path) -> Result<Vec<MetadataTable>> {
        tracing::debug!("reading metadata file {} for scheme {}", path.display(), scheme);
        load_metadata_file(path)
    }
}

/// Read and parse a `.meta` file
pub fn load_metadata_file(path: &Path) -> Result<Vec<MetadataTable>> {
    let content =
        fs::read_to_string(path).map_err(|e| TrackError::metadata_read(path, e.to_string()))?;
    parse_metadata(&content).map_err(|e| TrackError::MetadataParse {
        path: path.to_path_buf(),
        line: e.line,
        reason: e.reason,
    })
}
