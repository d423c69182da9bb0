//! Propagation Benchmarks
//!
//! Measures the cost of one push through a deep chain of derived streams and
//! through a wide fan-out joined back into a single stream.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rivulet_core::Stream;

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    for depth in [1usize, 16, 128] {
        let root = Stream::of(0u64);
        let mut tail = root.clone();
        for _ in 0..depth {
            tail = tail.map(|v| v + 1);
        }
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                root.push(black_box(n));
                black_box(tail.current())
            });
        });
    }
    group.finish();
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    for width in [2usize, 32, 256] {
        let root = Stream::of(0u64);
        let branches: Vec<Stream<u64>> = (0..width as u64).map(|k| root.map(move |v| v + k)).collect();
        let joined = Stream::combine_all(&branches, |values| values.iter().sum::<u64>());
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                root.push(black_box(n));
                black_box(joined.current())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain, bench_fan_out);
criterion_main!(benches);
