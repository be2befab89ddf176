//! Usage Record - the ordered result of a trace

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::metadata::Intent;

use super::matcher::SectionMatch;

/// Match outcome of one section of a scheme's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionUsage {
    /// Table the section belongs to
    pub table: String,
    /// Section title, e.g. `scheme_a_run`
    pub title: String,
    #[serde(flatten)]
    pub outcome: SectionMatch,
}

/// An exactly matching declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExactHit {
    pub section: String,
    pub local_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
}

/// Classification of a whole scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum SchemeOutcome {
    /// One hit per exactly matching section, in declaration order
    Exact { hits: Vec<ExactHit> },
    /// Candidates from all sections, first occurrence order, no duplicates
    Inexact { candidates: Vec<String> },
    NotFound,
}

impl SchemeOutcome {
    /// Combine per-section outcomes; any exact section makes the scheme exact
    pub fn from_sections(sections: &[SectionUsage]) -> Self {
        let hits: Vec<ExactHit> = sections
            .iter()
            .filter_map(|section| match &section.outcome {
                SectionMatch::Exact { local_name, intent } => Some(ExactHit {
                    section: section.title.clone(),
                    local_name: local_name.clone(),
                    intent: *intent,
                }),
                _ => None,
            })
            .collect();
        if !hits.is_empty() {
            return SchemeOutcome::Exact { hits };
        }

        let mut candidates: Vec<String> = vec![];
        for section in sections {
            if let SectionMatch::Inexact { candidates: found } = &section.outcome {
                for name in found {
                    if !candidates.contains(name) {
                        candidates.push(name.clone());
                    }
                }
            }
        }
        if candidates.is_empty() {
            SchemeOutcome::NotFound
        } else {
            SchemeOutcome::Inexact { candidates }
        }
    }

    /// Intents of the exact hits, without repeats
    pub fn intents(&self) -> Vec<Intent> {
        let mut intents = vec![];
        if let SchemeOutcome::Exact { hits } = self {
            for intent in hits.iter().filter_map(|hit| hit.intent) {
                if !intents.contains(&intent) {
                    intents.push(intent);
                }
            }
        }
        intents
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, SchemeOutcome::Exact { .. })
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, SchemeOutcome::NotFound)
    }
}

/// Everything recorded for one call-tree entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemeUsage {
    pub scheme: String,
    pub metadata_file: PathBuf,
    pub sections: Vec<SectionUsage>,
    pub outcome: SchemeOutcome,
}

impl SchemeUsage {
    pub fn new(
        scheme: impl Into<String>,
        metadata_file: impl Into<PathBuf>,
        sections: Vec<SectionUsage>,
    ) -> Self {
        let outcome = SchemeOutcome::from_sections(&sections);
        Self {
            scheme: scheme.into(),
            metadata_file: metadata_file.into(),
            sections,
            outcome,
        }
    }

    /// Whether any exact hit reads the variable
    pub fn reads(&self) -> bool {
        self.outcome.intents().iter().any(|intent| intent.reads())
    }

    /// Whether any exact hit writes the variable
    pub fn writes(&self) -> bool {
        self.outcome.intents().iter().any(|intent| intent.writes())
    }

    fn render_line(&self, variable: &str) -> String {
        match &self.outcome {
            SchemeOutcome::Exact { hits } => {
                let hits: Vec<String> = hits
                    .iter()
                    .map(|hit| match hit.intent {
                        Some(intent) => format!("intent {} ({})", intent, hit.section),
                        None => format!("no intent ({})", hit.section),
                    })
                    .collect();
                format!(
                    "Exact match found for variable {} in scheme {}: {}",
                    variable,
                    self.scheme,
                    hits.join(", ")
                )
            }
            SchemeOutcome::Inexact { candidates } => format!(
                "Found inexact matches for variable {} in scheme {}: [{}]",
                variable,
                self.scheme,
                candidates.join(", ")
            ),
            SchemeOutcome::NotFound => {
                format!("Did not find variable {} in scheme {}", variable, self.scheme)
            }
        }
    }
}

/// Ordered per-scheme usage of one variable across a suite
///
/// Holds exactly one entry per call-tree element, in call-tree order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub suite: String,
    pub variable: String,
    pub entries: Vec<SchemeUsage>,
}

impl UsageRecord {
    pub fn new(suite: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            variable: variable.into(),
            entries: vec![],
        }
    }

    pub fn push(&mut self, usage: SchemeUsage) {
        self.entries.push(usage);
    }

    /// First entry for `scheme`
    pub fn get(&self, scheme: &str) -> Option<&SchemeUsage> {
        self.entries.iter().find(|entry| entry.scheme == scheme)
    }

    /// Scheme names in call-tree order
    pub fn schemes(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.scheme.as_str()).collect()
    }

    /// Schemes that write the variable, in call order
    pub fn writers(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.writes())
            .map(|entry| entry.scheme.as_str())
            .collect()
    }

    /// Schemes that read the variable, in call order
    pub fn readers(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.reads())
            .map(|entry| entry.scheme.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Human-readable report, one line per call-tree entry
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(out, "{}", entry.render_line(&self.variable));
        }

        let writers = self.writers();
        if writers.is_empty() {
            let _ = writeln!(
                out,
                "For suite {}, no schemes modify the variable {}",
                self.suite, self.variable
            );
        } else {
            let _ = writeln!(
                out,
                "For suite {}, the following schemes (in order) modify the variable {}: {}",
                self.suite,
                self.variable,
                writers.join(", ")
            );
        }
        out
    }
}
