//! Benchmarks for the pure stages of a build.
//!
//! Run with: cargo bench

use std::path::Path;

use criterion::{BenchmarkId, Criterion};
use subdeck::{Cue, DeckBuilder, DeckOptions, ExtractionWindow, StyleFilter, normalize, parse_ass};

/// An ASS script with `lines` dialogue lines; every third line repeats the
/// timing of the previous one and every fifth carries a sign style.
fn synthetic_script(lines: usize) -> String {
    let mut script = String::from(
        "[Script Info]\nScriptType: v4.00+\n\n[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
    );
    let mut start = 0_u64;
    for index in 0..lines {
        if index % 3 != 2 {
            start += 2_500;
        }
        let style = if index % 5 == 0 { "Sign" } else { "Default" };
        let (begin, end) = (start, start + 1_800);
        script.push_str(&format!(
            "Dialogue: 0,{}:{:02}:{:02}.{:02},{}:{:02}:{:02}.{:02},{style},,0,0,0,,{{\\i1}}line {index}\\Nsecond half{{\\i0}}\n",
            begin / 3_600_000,
            begin / 60_000 % 60,
            begin / 1_000 % 60,
            begin % 1_000 / 10,
            end / 3_600_000,
            end / 60_000 % 60,
            end / 1_000 % 60,
            end % 1_000 / 10,
        ));
    }
    script
}

fn synthetic_cues(lines: usize) -> Vec<Cue> {
    parse_ass(&synthetic_script(lines), Path::new("bench.ass")).unwrap()
}

fn benchmark_subtitle_parsing(criterion: &mut Criterion) {
    let script = synthetic_script(2_000);
    criterion.bench_function("parse 2000 ASS dialogue lines", |bencher| {
        bencher.iter(|| parse_ass(&script, Path::new("bench.ass")).unwrap());
    });
}

fn benchmark_normalization(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("normalize");
    for lines in [100, 1_000, 10_000] {
        let cues = synthetic_cues(lines);
        group.bench_with_input(BenchmarkId::new("all styles", lines), &cues, |bencher, cues| {
            bencher.iter(|| normalize(cues, &StyleFilter::all()));
        });
        group.bench_with_input(BenchmarkId::new("Default only", lines), &cues, |bencher, cues| {
            let filter = StyleFilter::only(["Default"]);
            bencher.iter(|| normalize(cues, &filter));
        });
    }
    group.finish();
}

fn benchmark_windows(criterion: &mut Criterion) {
    let logical = normalize(&synthetic_cues(1_000), &StyleFilter::all());
    criterion.bench_function("compute 1000 windows", |bencher| {
        bencher.iter(|| {
            logical
                .iter()
                .filter_map(|cue| ExtractionWindow::compute(cue, -400).ok())
                .count()
        });
    });
}

fn benchmark_planning(criterion: &mut Criterion) {
    let cues = synthetic_cues(1_000);
    let builder = DeckBuilder::new(DeckOptions::new().with_offset_ms(250));
    criterion.bench_function("plan 1000 cues", |bencher| {
        bencher.iter(|| builder.plan(&cues));
    });
}

criterion::criterion_group!(
    benches,
    benchmark_subtitle_parsing,
    benchmark_normalization,
    benchmark_windows,
    benchmark_planning,
);
criterion::criterion_main!(benches);
