//! Throughput of history preparation, bar formation and display transforms.
//!
//! Run with: `cargo bench --package barstream-bench`

use barstream_bench::{minute_bars, raw_history, tick_pushes};
use barstream_lib::{
    BrickSizing, HeikinAshi, RenkoConfig, RenkoEngine, Resolution, TickAggregator,
    prepare_history,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const SIZES: [usize; 3] = [500, 5_000, 50_000];

fn history_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("prepare_history");
    for size in SIZES {
        let raw = raw_history(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("minutes", size), &raw, |b, raw| {
            b.iter(|| prepare_history(black_box(raw), Resolution::Minutes(1)));
        });
        group.bench_with_input(BenchmarkId::new("ticks", size), &raw, |b, raw| {
            b.iter(|| prepare_history(black_box(raw), Resolution::Ticks(500)));
        });
    }
    group.finish();
}

fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_aggregator");
    for size in SIZES {
        let ticks: Vec<_> = tick_pushes(size)
            .iter()
            .filter_map(|raw| raw.to_tick().ok())
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("500T", size), &ticks, |b, ticks| {
            b.iter(|| {
                let mut aggregator = TickAggregator::for_resolution(Resolution::Ticks(500));
                ticks
                    .iter()
                    .filter_map(|tick| aggregator.on_tick(*tick).ok())
                    .filter(|step| step.complete)
                    .count()
            });
        });
    }
    group.finish();
}

fn transform_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    for size in SIZES {
        let bars = minute_bars(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("heikin_ashi", size), &bars, |b, bars| {
            b.iter(|| HeikinAshi::new().convert(black_box(bars)));
        });

        group.bench_with_input(BenchmarkId::new("renko_fixed", size), &bars, |b, bars| {
            b.iter(|| {
                RenkoEngine::new(RenkoConfig::new(BrickSizing::Fixed(10.0)))
                    .convert(black_box(bars))
            });
        });

        group.bench_with_input(BenchmarkId::new("renko_atr", size), &bars, |b, bars| {
            b.iter(|| RenkoEngine::new(RenkoConfig::new(BrickSizing::Atr)).convert(black_box(bars)));
        });

        group.bench_with_input(BenchmarkId::new("renko_live", size), &bars, |b, bars| {
            b.iter(|| {
                let mut engine = RenkoEngine::new(RenkoConfig::new(BrickSizing::Fixed(10.0)));
                engine.convert(&bars[..1]);
                bars[1..].iter().map(|bar| engine.update(bar).len()).sum::<usize>()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, history_benchmark, tick_benchmark, transform_benchmark);
criterion_main!(benches);
