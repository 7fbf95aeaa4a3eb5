//! Series reconciliation benchmarks
//!
//! - Combining independently sampled families
//! - Downsampling long combined series
//! - Deriving every family from a raw scalar dump

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use runlens::downsample::{reduce_combined, DEFAULT_MAX_POINTS};
use runlens::reconcile::{combine, MetricSeries, ScalarLog, SeriesFamily};
use serde_json::{json, Value};

/// Series with a sample every `stride` steps
#[allow(clippy::cast_precision_loss)]
fn create_series(name: &str, points: u64, stride: u64) -> MetricSeries {
    MetricSeries::new(name, (0..points).map(|i| (i * stride, (i as f64).sin())))
}

/// Raw scalar dump with the action, loss and entropy tags
#[allow(clippy::cast_precision_loss)]
fn create_dump(points: u64) -> Value {
    let samples = |stride: u64| -> Value {
        (0..points)
            .map(|i| json!({"step": i * stride, "value": (i as f64) * 0.001, "wall_time": i}))
            .collect()
    };
    json!({
        "Actions/JumpPercentage": samples(100),
        "Actions/JogPercentage": samples(100),
        "Actions/SprintPercentage": samples(150),
        "Actions/RollPercentage": samples(200),
        "Actions/IdlePercentage": samples(100),
        "Losses/PolicyLoss": samples(100),
        "Losses/ValueLoss": samples(100),
        "Policy/Entropy": samples(100),
        "Episode/Length": samples(50),
        "Episode/TotalReward": samples(50),
    })
}

/// Benchmark step-union combination
fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");

    for size in [1_000u64, 10_000, 100_000] {
        let jump = create_series("jump", size, 100);
        let roll = create_series("roll", size / 2, 200);
        let idle = create_series("idle", size, 150);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let combined = combine(&[
                    ("jump", Some(&jump)),
                    ("roll", Some(&roll)),
                    ("sprint", None),
                    ("idle", Some(&idle)),
                ]);
                black_box(combined.len());
            });
        });
    }

    group.finish();
}

/// Benchmark downsampling to the default point cap
fn bench_downsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("downsample");

    for size in [1_000u64, 10_000, 100_000] {
        let jump = create_series("jump", size, 100);
        let roll = create_series("roll", size, 100);
        let combined = combine(&[("jump", Some(&jump)), ("roll", Some(&roll))]);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(reduce_combined(&combined, DEFAULT_MAX_POINTS)));
        });
    }

    group.finish();
}

/// Benchmark deriving all families from a parsed dump
fn bench_derive_families(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_families");

    for size in [1_000u64, 10_000] {
        let dump = create_dump(size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let scalars = ScalarLog::from_value(&dump);
                for family in SeriesFamily::ALL {
                    black_box(family.derive(&scalars));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_combine, bench_downsample, bench_derive_families);
criterion_main!(benches);
