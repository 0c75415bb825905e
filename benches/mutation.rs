//! Benchmarks for the rule mutation engine.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use rulegen::{
    evolution::{FitnessSnapshot, RuleRng, compare},
    schema::{MutationConfig, RuleSet, Vocabulary},
};

fn seed_rules(count: usize) -> RuleSet {
    let sprites = ["avatar", "wall", "box", "goal", "enemy", "coin"];
    let interactions: Vec<String> = (0..count)
        .map(|i| {
            format!(
                "{} {} > killSprite scoreChange={}",
                sprites[i % sprites.len()],
                sprites[(i + 1) % sprites.len()],
                i
            )
        })
        .collect();
    let terminations = vec!["avatar goal > SpriteCounter stype=goal win=True limit=0".to_string()];
    RuleSet::from_text(&interactions, &terminations).unwrap()
}

fn bench_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutate");
    let vocabulary = Vocabulary::new(["avatar", "wall", "box", "goal", "enemy", "coin"]).unwrap();
    let config = MutationConfig {
        mutation_amount: 8,
        ..Default::default()
    };

    for size in [4, 16, 64, 256] {
        let base = seed_rules(size);
        let mut rng = RuleRng::new(42);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_rules", size)),
            &size,
            |b, _| {
                b.iter(|| {
                    let mut rules = base.clone();
                    rng.mutate(black_box(&mut rules), &config, &vocabulary);
                    rules
                });
            },
        );
    }

    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");

    for size in [100, 1000] {
        let population: Vec<FitnessSnapshot> = (0..size)
            .map(|i| {
                let constraint = if i % 3 == 0 { 1.0 } else { (i % 10) as f64 / 10.0 };
                FitnessSnapshot::new(constraint, vec![(i % 17) as f64, (i % 5) as f64])
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut sorted = population.clone();
                sorted.sort_by(|a, b| compare(b, a));
                black_box(sorted)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_mutate, bench_ranking);
criterion_main!(benches);
