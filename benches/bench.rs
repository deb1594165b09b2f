// Criterion benchmarks for Hail Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hail_match::core::{haversine_miles, Matcher, SearchStrategy};
use hail_match::models::{MatchConfig, PropertyRecord, StormEvent};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn create_events(count: usize, rng: &mut ChaCha8Rng) -> Vec<StormEvent> {
    (0..count)
        .map(|i| {
            StormEvent::new(
                i as u64,
                rng.gen_range(30.0..34.5),
                rng.gen_range(-100.0..-94.0),
                rng.gen_range(0.5..3.5),
            )
        })
        .collect()
}

fn create_properties(count: usize, rng: &mut ChaCha8Rng) -> Vec<PropertyRecord> {
    (0..count)
        .map(|i| {
            PropertyRecord::new(
                format!("R{:07}", i),
                rng.gen_range(32.5..33.1),
                rng.gen_range(-97.5..-96.5),
            )
        })
        .collect()
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_miles", |b| {
        b.iter(|| {
            haversine_miles(
                black_box(32.7767),
                black_box(-96.7970),
                black_box(32.7555),
                black_box(-97.3308),
            )
        });
    });
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    let matcher = Matcher::new(&MatchConfig::default()).unwrap();

    for &(properties, events) in &[(1_000, 100), (10_000, 1_000), (50_000, 5_000)] {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let event_catalog = create_events(events, &mut rng);
        let property_catalog = create_properties(properties, &mut rng);
        let label = format!("{}x{}", properties, events);

        group.bench_with_input(BenchmarkId::new("indexed", &label), &label, |b, _| {
            let indexed = matcher.with_strategy(SearchStrategy::Indexed);
            b.iter(|| indexed.run(black_box(&property_catalog), black_box(&event_catalog)));
        });

        // The exhaustive scan is quadratic; keep it to the smaller catalogs
        if properties <= 10_000 {
            group.bench_with_input(BenchmarkId::new("exhaustive", &label), &label, |b, _| {
                let naive = matcher.with_strategy(SearchStrategy::Exhaustive);
                b.iter(|| naive.run(black_box(&property_catalog), black_box(&event_catalog)));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_haversine_distance, bench_matching);
criterion_main!(benches);
