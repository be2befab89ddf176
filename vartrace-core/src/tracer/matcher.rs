//! Variable Matcher - classifies declared variables against a target
//!
//! Matching is purely on standard names:
//! - exact: full, case-sensitive equality
//! - inexact: the target is a substring of the declared name (never the reverse)
//!
//! Within a section the first exact match ends the scan and replaces any
//! inexact candidates collected before it.

use serde::Serialize;

use crate::metadata::{Intent, MetadataSection};

/// Outcome of comparing the target with one standard name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableMatch {
    Exact,
    Inexact,
    NoMatch,
}

/// Outcome of scanning one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum SectionMatch {
    /// The section declares the target itself
    Exact {
        local_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        intent: Option<Intent>,
    },
    /// Standard names containing the target, in declaration order
    Inexact { candidates: Vec<String> },
    NotFound,
}

impl SectionMatch {
    pub fn is_exact(&self) -> bool {
        matches!(self, SectionMatch::Exact { .. })
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, SectionMatch::NotFound)
    }
}

/// Matches one target standard name
#[derive(Debug, Clone, Copy)]
pub struct VariableMatcher<'a> {
    target: &'a str,
}

impl<'a> VariableMatcher<'a> {
    pub fn new(target: &'a str) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &str {
        self.target
    }

    /// Classify a single declared standard name
    pub fn classify(&self, standard_name: &str) -> VariableMatch {
        if standard_name == self.target {
            VariableMatch::Exact
        } else if !self.target.is_empty() && standard_name.contains(self.target) {
            VariableMatch::Inexact
        } else {
            VariableMatch::NoMatch
        }
    }

    /// Scan a section's variables in declaration order
    pub fn scan_section(&self, section: &MetadataSection) -> SectionMatch {
        let mut candidates: Vec<String> = vec![];

        for var in section.variable_list() {
            match self.classify(&var.standard_name) {
                VariableMatch::Exact => {
                    tracing::debug!(
                        "found variable {} in section {}",
                        self.target,
                        section.title
                    );
                    return SectionMatch::Exact {
                        local_name: var.local_name.clone(),
                        intent: var.intent,
                    };
                }
                VariableMatch::Inexact => candidates.push(var.standard_name.clone()),
                VariableMatch::NoMatch => {}
            }
        }

        if candidates.is_empty() {
            SectionMatch::NotFound
        } else {
            SectionMatch::Inexact { candidates }
        }
    }
}
