//! Host-model variable definitions
//!
//! The prebuild config lists the host model's variable definition files. Their
//! `.meta` companions declare what the host provides; the report uses this to
//! say whether the traced variable comes from the host at all.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::PrebuildConfig;
use crate::error::Result;

use super::{load_metadata_file, MetadataTable};

/// Where the host model declares a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostDefinition {
    pub table: String,
    pub section: String,
    pub local_name: String,
}

/// Host variables indexed by standard name
#[derive(Debug, Clone, Default)]
pub struct HostVariables {
    definitions: BTreeMap<String, Vec<HostDefinition>>,
}

impl HostVariables {
    /// Load the metadata for every `variable_definition_files` entry
    pub fn gather(config: &PrebuildConfig) -> Result<Self> {
        let mut host = HostVariables::default();

        for source in &config.variable_definition_files {
            let meta = config.resolve(source).with_extension("meta");
            tracing::debug!("reading host metadata {}", meta.display());
            host.add_tables(&load_metadata_file(&meta)?);
        }

        if !config.typedefs_new_metadata.is_empty() {
            tracing::debug!(
                "{} typedef modules mapped in typedefs_new_metadata",
                config.typedefs_new_metadata.len()
            );
        }
        tracing::debug!("host model defines {} standard names", host.len());

        Ok(host)
    }

    /// Index the variables of already-parsed tables
    pub fn add_tables(&mut self, tables: &[MetadataTable]) {
        for table in tables {
            for section in table.sections() {
                for var in section.variable_list() {
                    self.definitions
                        .entry(var.standard_name.clone())
                        .or_default()
                        .push(HostDefinition {
                            table: table.name.clone(),
                            section: section.title.clone(),
                            local_name: var.local_name.clone(),
                        });
                }
            }
        }
    }

    pub fn provides(&self, standard_name: &str) -> bool {
        self.definitions.contains_key(standard_name)
    }

    pub fn definitions(&self, standard_name: &str) -> &[HostDefinition] {
        self.definitions
            .get(standard_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct standard names
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
