//! Benchmark for message formatting and validation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use parley::format::{self, FormatOptions, ValidationConstraints};

const REPLY: &str = "**Peter** has worked with *Rust* and `tokio` since 2019.<br>\
See https://example.com/projects for details & more <notes>.";

fn bench_format(c: &mut Criterion) {
    let options = FormatOptions::assistant();
    c.bench_function("format_assistant_reply", |b| {
        b.iter(|| format::format(black_box(REPLY), &options))
    });

    let mut group = c.benchmark_group("format_by_length");
    for repeat in [1usize, 10, 100] {
        let text = REPLY.repeat(repeat);
        group.bench_with_input(BenchmarkId::from_parameter(repeat), &text, |b, text| {
            b.iter(|| format::format(black_box(text), &FormatOptions::default()))
        });
    }
    group.finish();
}

fn bench_strip_and_validate(c: &mut Criterion) {
    let formatted = format::format(REPLY, &FormatOptions::assistant());
    c.bench_function("strip_formatting", |b| {
        b.iter(|| format::strip_formatting(black_box(&formatted)))
    });

    let constraints = ValidationConstraints::default();
    c.bench_function("validate_message", |b| {
        b.iter(|| format::validate(black_box(REPLY), &constraints))
    });
}

criterion_group!(benches, bench_format, bench_strip_and_validate);
criterion_main!(benches);
