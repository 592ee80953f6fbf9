use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;
use std::path::PathBuf;

use bandprep_core::parser::{parse_catalog_str, validate_catalog};

fn synth_catalog_toml(questions: u32) -> String {
    let mut toml = String::from(
        r#"
[catalog]
id = "bench"
name = "Bench Catalog"
skill = "listening"
duration_secs = 3600

[band_scale]
floor = 5.5
steps = [
    { min_correct = 36, band = 8.5 },
    { min_correct = 32, band = 7.5 },
    { min_correct = 28, band = 6.5 },
]
"#,
    );
    for id in 1..=questions {
        write!(
            toml,
            r#"
[[questions]]
id = {id}
kind = "fill-in-blank"
prompt = "Gap number {id} in the recording"
answer = "answer-{id}"
group = {group}
"#,
            group = 1 + id / 14,
        )
        .unwrap();
    }
    toml
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_catalog");
    let path = PathBuf::from("bench.toml");

    for size in [40u32, 200] {
        let toml = synth_catalog_toml(size);
        group.bench_function(format!("{size} questions"), |b| {
            b.iter(|| parse_catalog_str(black_box(&toml), &path).unwrap())
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let toml = synth_catalog_toml(40);
    let catalog = parse_catalog_str(&toml, &PathBuf::from("bench.toml")).unwrap();
    c.bench_function("validate_catalog", |b| {
        b.iter(|| validate_catalog(black_box(&catalog)))
    });
}

criterion_group!(benches, bench_parse, bench_validate);
criterion_main!(benches);
