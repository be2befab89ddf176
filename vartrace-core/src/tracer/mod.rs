//! Variable usage tracing - the core of vartrace
//!
//! Cross-references one standard name against every scheme in a suite's call
//! tree and records, per scheme, whether the variable is declared and with
//! which intent.
//!
//! ## Architecture
//!
//! ```text
//! Suite (call tree)        SchemeFileIndex
//!         │                       │
//!         ▼                       ▼
//!    ┌────────────────────────────────────┐
//!    │            UsageTracer             │
//!    │                                    │
//!    │  1. Look up the scheme's .meta     │
//!    │  2. Resolve its tables/sections    │
//!    │  3. Scan each section (matcher)    │
//!    │  4. Record the scheme's outcome    │
//!    └────────────────────────────────────┘
//!                     │
//!                     ▼
//!          UsageRecord (call-tree order)
//! ```

mod matcher;
mod usage;
mod usage_tracer;

pub use matcher::{SectionMatch, VariableMatch, VariableMatcher};
pub use usage::{ExactHit, SchemeOutcome, SchemeUsage, SectionUsage, UsageRecord};
pub use usage_tracer::{trace, UsageTracer};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use crate::error::{ErrorKind, Result, TrackError};
    use crate::metadata::{
        Intent, MetadataResolver, MetadataSection, MetadataTable, SchemeFileIndex, VariableRecord,
    };

    /// Metadata served from memory, keyed by file path
    #[derive(Default)]
    struct InMemoryResolver {
        files: HashMap<PathBuf, Vec<MetadataTable>>,
    }

    impl InMemoryResolver {
        fn with_scheme(mut self, scheme: &str, vars: &[(&str, &str, Intent)]) -> Self {
            let section = vars.iter().fold(
                MetadataSection::new(format!("{}_run", scheme), "scheme"),
                |section, (local, standard, intent)| {
                    section
                        .with_variable(VariableRecord::new(*local, *standard).with_intent(*intent))
                },
            );
            self.files.insert(
                PathBuf::from(format!("meta/{}.meta", scheme)),
                vec![MetadataTable::new(scheme, "scheme").with_section(section)],
            );
            self
        }

        fn index(&self) -> SchemeFileIndex {
            SchemeFileIndex::from_entries(
                "meta",
                self.files
                    .iter()
                    .map(|(path, tables)| (tables[0].name.clone(), path.clone())),
            )
        }
    }

    impl MetadataResolver for InMemoryResolver {
        fn resolve(&self, _scheme: &str, path: &Path) -> Result<Vec<MetadataTable>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| TrackError::MetadataRead {
                    path: path.to_path_buf(),
                    reason: "not in memory".to_string(),
                })
        }
    }

    fn pressure_schemes() -> InMemoryResolver {
        InMemoryResolver::default()
            .with_scheme("scheme_a", &[("ps", "surface_pressure", Intent::In)])
            .with_scheme(
                "scheme_b",
                &[("ps_pert", "surface_pressure_perturbation", Intent::In)],
            )
            .with_scheme("scheme_c", &[("im", "horizontal_loop_extent", Intent::In)])
            .with_scheme(
                "scheme_d",
                &[
                    ("ps_pert", "surface_pressure_perturbation", Intent::In),
                    ("ps", "surface_pressure", Intent::InOut),
                ],
            )
    }

    #[test]
    fn test_trace_exact_and_inexact() {
        let resolver = pressure_schemes();
        let index = resolver.index();
        let tracer = UsageTracer::with_resolver(&index, resolver);

        let record = tracer
            .trace_call_tree(&["scheme_a", "scheme_b"], "suite_test", "surface_pressure")
            .unwrap();

        assert_eq!(record.schemes(), vec!["scheme_a", "scheme_b"]);
        assert_eq!(
            record.entries[0].outcome,
            SchemeOutcome::Exact {
                hits: vec![ExactHit {
                    section: "scheme_a_run".to_string(),
                    local_name: "ps".to_string(),
                    intent: Some(Intent::In),
                }]
            }
        );
        assert_eq!(
            record.entries[1].outcome,
            SchemeOutcome::Inexact {
                candidates: vec!["surface_pressure_perturbation".to_string()]
            }
        );
    }

    #[test]
    fn test_one_entry_per_call_in_order() {
        let resolver = pressure_schemes();
        let index = resolver.index();
        let tracer = UsageTracer::with_resolver(&index, resolver);

        let call_tree = ["scheme_c", "scheme_a", "scheme_d", "scheme_a", "scheme_b"];
        let record = tracer
            .trace_call_tree(&call_tree, "suite_test", "surface_pressure")
            .unwrap();

        assert_eq!(record.len(), call_tree.len());
        assert_eq!(record.schemes(), call_tree.to_vec());
        assert_eq!(record.entries[0].outcome, SchemeOutcome::NotFound);
        assert!(record.entries[2].outcome.is_exact());
        assert_eq!(record.writers(), vec!["scheme_d"]);
    }

    #[test]
    fn test_missing_scheme_fails_whole_trace() {
        let resolver = pressure_schemes();
        let index = resolver.index();
        let tracer = UsageTracer::with_resolver(&index, resolver);

        let err = tracer
            .trace_call_tree(&["scheme_a", "scheme_x"], "suite_test", "surface_pressure")
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Lookup);
        match err {
            TrackError::SchemeNotFound {
                scheme,
                suite,
                variable,
                metadata_path,
            } => {
                assert_eq!(scheme, "scheme_x");
                assert_eq!(suite, "suite_test");
                assert_eq!(variable, "surface_pressure");
                assert_eq!(metadata_path, PathBuf::from("meta"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_resolver_errors_propagate() {
        let resolver = pressure_schemes();
        let index = SchemeFileIndex::from_entries("meta", [("scheme_a", "meta/elsewhere.meta")]);
        let tracer = UsageTracer::with_resolver(&index, resolver);

        let err = tracer
            .trace_call_tree(&["scheme_a"], "suite_test", "surface_pressure")
            .unwrap_err();
        assert!(matches!(err, TrackError::MetadataRead { .. }));
    }

    #[test]
    fn test_shared_file_scans_only_own_scheme_table() {
        let shared = PathBuf::from("meta/multi.meta");
        let mut resolver = InMemoryResolver::default();
        resolver.files.insert(
            shared.clone(),
            vec![
                MetadataTable::new("multi_types", "ddt").with_section(
                    MetadataSection::new("multi_state", "ddt").with_variable(VariableRecord::new(
                        "ps_top",
                        "surface_pressure_at_top",
                    )),
                ),
                MetadataTable::new("scheme_b", "scheme").with_section(
                    MetadataSection::new("scheme_b_run", "scheme").with_variable(
                        VariableRecord::new("im", "horizontal_loop_extent")
                            .with_intent(Intent::In),
                    ),
                ),
                MetadataTable::new("scheme_c", "scheme").with_section(
                    MetadataSection::new("scheme_c_run", "scheme").with_variable(
                        VariableRecord::new("ps", "surface_pressure").with_intent(Intent::Out),
                    ),
                ),
            ],
        );
        let index = SchemeFileIndex::from_entries(
            "meta",
            [("scheme_b", shared.clone()), ("scheme_c", shared)],
        );
        let tracer = UsageTracer::with_resolver(&index, resolver);

        let record = tracer
            .trace_call_tree(&["scheme_b", "scheme_c"], "suite_test", "surface_pressure")
            .unwrap();

        let b = record.get("scheme_b").unwrap();
        let titles: Vec<&str> = b.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["multi_state", "scheme_b_run"]);
        assert_eq!(
            b.outcome,
            SchemeOutcome::Inexact {
                candidates: vec!["surface_pressure_at_top".to_string()]
            }
        );
        assert!(record.get("scheme_c").unwrap().outcome.is_exact());
        assert_eq!(record.writers(), vec!["scheme_c"]);
    }

    #[test]
    fn test_trace_is_repeatable() {
        let resolver = pressure_schemes();
        let index = resolver.index();
        let tracer = UsageTracer::with_resolver(&index, resolver);
        let call_tree = ["scheme_a", "scheme_b", "scheme_c", "scheme_d"];

        let first = tracer
            .trace_call_tree(&call_tree, "suite_test", "surface_pressure")
            .unwrap();
        let other = tracer
            .trace_call_tree(&call_tree, "suite_test", "horizontal_loop_extent")
            .unwrap();
        let second = tracer
            .trace_call_tree(&call_tree, "suite_test", "surface_pressure")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(other.get("scheme_c").unwrap().outcome.intents(), vec![Intent::In]);
    }
}
