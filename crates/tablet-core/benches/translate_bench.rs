//! Criterion benchmarks for sample-to-burst translation.
//!
//! Translation runs once per digitizer packet (~130 Hz on ISDV4 hardware), so
//! it must stay far below a microsecond.
//!
//! Run with:
//! ```bash
//! cargo bench --package tablet-core --bench translate_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tablet_core::{translate, PressureThreshold, Sample};

fn bench_translate(c: &mut Criterion) {
    let threshold = PressureThreshold::default();
    let in_range = Sample::in_range(12000, 9000, 180);
    let out_of_range = Sample::out_of_range();
    let partial = Sample {
        x: None,
        ..Sample::in_range(0, 9000, 180)
    };

    let mut group = c.benchmark_group("translate");
    group.bench_function("in_range", |b| {
        b.iter(|| translate(black_box(&in_range), threshold))
    });
    group.bench_function("out_of_range", |b| {
        b.iter(|| translate(black_box(&out_of_range), threshold))
    });
    group.bench_function("partial", |b| {
        b.iter(|| translate(black_box(&partial), threshold))
    });
    group.finish();
}

criterion_group!(benches, bench_translate);
criterion_main!(benches);
