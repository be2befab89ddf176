//! End-to-end invocation: configuration in, report out

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::{PrebuildConfig, TrackConfig};
use crate::error::Result;
use crate::metadata::{HostDefinition, HostVariables, SchemeFileIndex};
use crate::suite::Suite;
use crate::tracer::{UsageRecord, UsageTracer};

/// Result of a full invocation
#[derive(Debug, Clone, Serialize)]
pub struct TrackReport {
    /// Definition file the suite came from
    pub sdf: String,
    pub usage: UsageRecord,
    /// Where the host model declares the variable, if it does
    pub host_definitions: Vec<HostDefinition>,
}

impl TrackReport {
    /// Full textual report
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Tracing variable {} through suite {} ({})",
            self.usage.variable, self.usage.suite, self.sdf
        );
        if self.host_definitions.is_empty() {
            let _ = writeln!(
                out,
                "Variable {} is not defined by the host model",
                self.usage.variable
            );
        } else {
            let defs: Vec<String> = self
                .host_definitions
                .iter()
                .map(|def| format!("{} ({})", def.local_name, def.table))
                .collect();
            let _ = writeln!(
                out,
                "Variable {} is defined by the host model as {}",
                self.usage.variable,
                defs.join(", ")
            );
        }
        out.push_str(&self.usage.render());
        out
    }
}

/// Run every stage in order; the first failure ends the invocation
pub fn run(config: &TrackConfig) -> Result<TrackReport> {
    config.validate()?;
    if config.debug {
        tracing::debug!(?config, "debug output enabled");
    }

    let suite = Suite::parse(&config.sdf)?;
    tracing::info!(
        "suite {} calls {} schemes",
        suite.name(),
        suite.call_tree().len()
    );

    let prebuild = PrebuildConfig::load(&config.config)?;
    let host = HostVariables::gather(&prebuild)?;

    let index = SchemeFileIndex::build(&config.metadata_path)?;
    tracing::debug!(
        "indexed {} schemes from {} metadata files",
        index.len(),
        index.file_count()
    );

    for scheme in suite.call_tree() {
        if let Some(file) = index.get(scheme) {
            if !prebuild.declares_scheme_file(file) {
                tracing::warn!(
                    "metadata {} for scheme {} is not listed in scheme_files",
                    file.display(),
                    scheme
                );
            }
        }
    }

    let usage = UsageTracer::new(&index).trace(&suite, &config.variable)?;

    Ok(TrackReport {
        sdf: suite.sdf_name().display().to_string(),
        host_definitions: host.definitions(&config.variable).to_vec(),
        usage,
    })
}
