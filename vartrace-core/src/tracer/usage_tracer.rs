//! Usage Tracer - walks a call tree and records per-scheme variable usage

use std::path::Path;

use crate::error::{Result, TrackError};
use crate::metadata::{FileMetadataResolver, MetadataResolver, SchemeFileIndex};
use crate::suite::Suite;

use super::matcher::VariableMatcher;
use super::usage::{SchemeUsage, SectionUsage, UsageRecord};

/// Traces variables through call trees against a fixed scheme-file index
///
/// Holds no per-trace state, so one tracer can run any number of traces.
#[derive(Debug)]
pub struct UsageTracer<'a, R = FileMetadataResolver> {
    index: &'a SchemeFileIndex,
    resolver: R,
}

impl<'a> UsageTracer<'a> {
    /// Tracer reading metadata from disk
    pub fn new(index: &'a SchemeFileIndex) -> Self {
        Self::with_resolver(index, FileMetadataResolver)
    }
}

impl<'a, R: MetadataResolver> UsageTracer<'a, R> {
    pub fn with_resolver(index: &'a SchemeFileIndex, resolver: R) -> Self {
        Self { index, resolver }
    }

    /// Trace `variable` through the suite's call tree
    pub fn trace(&self, suite: &Suite, variable: &str) -> Result<UsageRecord> {
        self.trace_call_tree(suite.call_tree(), suite.name(), variable)
    }

    /// Trace `variable` through an explicit call tree
    ///
    /// Fails on the first scheme without metadata; nothing is reported for
    /// the schemes already visited.
    pub fn trace_call_tree<S: AsRef<str>>(
        &self,
        call_tree: &[S],
        suite_name: &str,
        variable: &str,
    ) -> Result<UsageRecord> {
        let matcher = VariableMatcher::new(variable);
        let mut record = UsageRecord::new(suite_name, variable);

        tracing::info!(
            "tracing variable {} through {} scheme calls of suite {}",
            variable,
            call_tree.len(),
            suite_name
        );

        for scheme in call_tree {
            let scheme = scheme.as_ref();
            tracing::debug!("reading meta file for scheme {}", scheme);

            let metadata_file =
                self.index
                    .get(scheme)
                    .ok_or_else(|| TrackError::SchemeNotFound {
                        scheme: scheme.to_string(),
                        suite: suite_name.to_string(),
                        variable: variable.to_string(),
                        metadata_path: self.index.root().to_path_buf(),
                    })?;

            let sections = self.scan_scheme(&matcher, scheme, metadata_file)?;
            record.push(SchemeUsage::new(scheme, metadata_file, sections));
        }

        Ok(record)
    }

    fn scan_scheme(
        &self,
        matcher: &VariableMatcher<'_>,
        scheme: &str,
        metadata_file: &Path,
    ) -> Result<Vec<SectionUsage>> {
        let tables = self.resolver.resolve(scheme, metadata_file)?;

        let mut sections = vec![];
        // Other schemes sharing the file keep their own intents
        for table in tables
            .iter()
            .filter(|table| !table.is_scheme() || table.name == scheme)
        {
            for section in table.sections() {
                let outcome = matcher.scan_section(section);
                tracing::debug!(
                    scheme,
                    section = %section.title,
                    "section outcome: {:?}",
                    outcome
                );
                sections.push(SectionUsage {
                    table: table.name.clone(),
                    title: section.title.clone(),
                    outcome,
                });
            }
        }
        Ok(sections)
    }
}

/// Trace `variable` through `call_tree`, reading metadata from disk
pub fn trace<S: AsRef<str>>(
    call_tree: &[S],
    suite_name: &str,
    variable: &str,
    index: &SchemeFileIndex,
) -> Result<UsageRecord> {
    UsageTracer::new(index).trace_call_tree(call_tree, suite_name, variable)
}
