use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hllpp::Hll;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Cardinalities covering the sparse regime, the promotion boundary, and
/// the dense regime at p = 14.
const CARDINALITIES: [usize; 4] = [100, 1_000, 10_000, 1_000_000];

criterion_group!(benches, benchmark);
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    for &cardinality in &CARDINALITIES {
        group.throughput(Throughput::Elements(cardinality as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(cardinality),
            &cardinality,
            |b, &cardinality| {
                let values = rand_u64s(cardinality as u64, cardinality);
                b.iter(|| {
                    let mut hll = Hll::new(14, 25);
                    for &x in &values {
                        hll.add(black_box(x));
                    }
                    hll
                });
            },
        );
    }
    group.finish();

    let mut group = c.benchmark_group("cardinality");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &CARDINALITIES {
        group.bench_with_input(
            BenchmarkId::from_parameter(cardinality),
            &cardinality,
            |b, &cardinality| {
                let mut hll = Hll::new(14, 25);
                for x in rand_u64s(cardinality as u64, cardinality) {
                    hll.add(x);
                }
                b.iter(|| black_box(&mut hll).cardinality());
            },
        );
    }
    group.finish();

    let mut group = c.benchmark_group("combine");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &CARDINALITIES {
        group.bench_with_input(
            BenchmarkId::from_parameter(cardinality),
            &cardinality,
            |b, &cardinality| {
                let mut left = Hll::new(14, 25);
                for x in rand_u64s(1, cardinality) {
                    left.add(x);
                }
                let mut right = Hll::new(14, 25);
                for x in rand_u64s(2, cardinality) {
                    right.add(x);
                }
                b.iter(|| {
                    let mut union = left.clone();
                    union.combine(black_box(&mut right));
                    union
                });
            },
        );
    }
    group.finish();
}

fn rand_u64s(seed: u64, count: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen()).collect()
}
