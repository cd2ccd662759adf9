//! Propagation benchmarks.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::reactive::{batch, computed, Effect, Signal};

fn bench_signal_set(c: &mut Criterion) {
    let s = Signal::new(0_i64);
    let mut next = 0_i64;
    c.bench_function("signal_set_no_subscribers", |b| {
        b.iter(|| {
            next += 1;
            s.set(black_box(next))
        })
    });
}

fn bench_signal_set_same_value(c: &mut Criterion) {
    let s = Signal::new(42_i64);
    c.bench_function("signal_set_same_value", |b| b.iter(|| s.set(black_box(42))));
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    for width in [1_usize, 10, 100] {
        let source = Signal::new(0_i64);
        let effects: Vec<Effect> = (0..width)
            .map(|_| {
                let s = source.clone();
                Effect::new(move |_| {
                    black_box(s.get());
                })
            })
            .collect();
        let mut next = 0_i64;
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                next += 1;
                source.set(next)
            })
        });
        drop(effects);
    }
    group.finish();
}

fn bench_computed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("computed_chain");
    for depth in [1_usize, 10, 50] {
        let source = Signal::new(0_i64);
        let s = source.clone();
        let mut tail = computed(move || s.get() + 1);
        let mut chain = Vec::with_capacity(depth);
        for _ in 1..depth {
            let prev = tail.clone();
            chain.push(tail);
            tail = computed(move || prev.get() + 1);
        }
        let mut next = 0_i64;
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                next += 1;
                source.set(next);
                black_box(tail.peek())
            })
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let signals: Vec<Signal<i64>> = (0..10).map(Signal::new).collect();
    let watched = signals.clone();
    let _effect = Effect::new(move |_| {
        black_box(watched.iter().map(Signal::get).sum::<i64>());
    });
    let mut next = 100_i64;
    c.bench_function("batch_10_writes", |b| {
        b.iter(|| {
            next += 1;
            batch(|| {
                for s in &signals {
                    s.set(next);
                }
            })
        })
    });
}

criterion_group!(
    benches,
    bench_signal_set,
    bench_signal_set_same_value,
    bench_fan_out,
    bench_computed_chain,
    bench_batch,
);
criterion_main!(benches);
