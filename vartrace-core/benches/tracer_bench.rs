//! Benchmarks for the matcher and the usage tracer
//!
//! Uses an in-memory suite of synthetic schemes so only matching is measured.

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vartrace_core::{
    Intent, MetadataResolver, MetadataSection, MetadataTable, Result, SchemeFileIndex,
    UsageTracer, VariableMatcher, VariableRecord,
};

const VARIABLES_PER_SECTION: usize = 200;

fn create_section(scheme: &str) -> MetadataSection {
    (0..VARIABLES_PER_SECTION).fold(
        MetadataSection::new(format!("{}_run", scheme), "scheme"),
        |section, i| {
            section.with_variable(
                VariableRecord::new(format!("v{}", i), format!("synthetic_quantity_{}_at_surface", i))
                    .with_intent(Intent::In),
            )
        },
    )
}

struct SyntheticResolver;

impl MetadataResolver for SyntheticResolver {
    fn resolve(&self, scheme: &str, _path: &Path) -> Result<Vec<MetadataTable>> {
        Ok(vec![MetadataTable::new(scheme, "scheme").with_section(create_section(scheme))])
    }
}

fn bench_scan_section(c: &mut Criterion) {
    let section = create_section("scheme_a");

    c.bench_function("scan_section_exact_last", |b| {
        let matcher = VariableMatcher::new("synthetic_quantity_199_at_surface");
        b.iter(|| black_box(matcher.scan_section(&section)))
    });

    c.bench_function("scan_section_inexact", |b| {
        let matcher = VariableMatcher::new("at_surface");
        b.iter(|| black_box(matcher.scan_section(&section)))
    });
}

fn bench_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace_call_tree");

    for scheme_count in [10usize, 100] {
        let schemes: Vec<String> = (0..scheme_count).map(|i| format!("scheme_{}", i)).collect();
        let index = SchemeFileIndex::from_entries(
            "meta",
            schemes.iter().map(|s| (s.clone(), format!("meta/{}.meta", s))),
        );
        let tracer = UsageTracer::with_resolver(&index, SyntheticResolver);

        group.bench_with_input(
            BenchmarkId::from_parameter(scheme_count),
            &schemes,
            |b, schemes| {
                b.iter(|| {
                    let record = tracer
                        .trace_call_tree(schemes.as_slice(), "bench_suite", "synthetic_quantity_42_at_surface")
                        .unwrap();
                    black_box(record)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_scan_section, bench_trace);
criterion_main!(benches);
