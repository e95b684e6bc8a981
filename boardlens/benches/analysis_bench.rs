use criterion::{black_box, criterion_group, criterion_main, Criterion};
use boardlens::prelude::*;
use std::path::PathBuf;

fn fixtures_dir() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .to_string_lossy()
        .into_owned()
}

fn bench_analyze_project(c: &mut Criterion) {
    let dir = fixtures_dir();
    let options = AnalyzeOptions::default();

    c.bench_function("analyze_project", |b| {
        b.iter(|| BoardLens::analyze_project(black_box(&dir), black_box(&options)));
    });
}

fn bench_parse_pcb(c: &mut Criterion) {
    let content = std::fs::read_to_string(
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/demo.kicad_pcb"),
    )
    .unwrap();

    c.bench_function("parse_pcb", |b| {
        b.iter(|| boardlens::parse_pcb(black_box(&content), black_box("demo.kicad_pcb")));
    });
}

criterion_group!(benches, bench_analyze_project, bench_parse_pcb);
criterion_main!(benches);
