//! Benchmarks for the pure progression math.

use std::collections::HashSet;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use realmforge::badge;
use realmforge::level;
use realmforge::model::StatsSnapshot;
use realmforge::streak;

fn bench_level_for_xp(c: &mut Criterion) {
    c.bench_function("level_for_xp_1m", |bench| {
        bench.iter(|| black_box(level::level_for_xp(black_box(1_000_000))))
    });
}

fn bench_streak_decision(c: &mut Criterion) {
    c.bench_function("streak_on_completion", |bench| {
        bench.iter(|| {
            black_box(streak::streak_on_completion(
                black_box(6),
                black_box(0),
                black_box(1),
            ))
        })
    });
}

fn bench_badge_evaluate(c: &mut Criterion) {
    let stats = StatsSnapshot {
        tasks_completed: 100,
        streak: 8,
        total_xp: 12_345,
        level: 11,
    };
    let earned = HashSet::new();

    c.bench_function("badge_evaluate_all", |bench| {
        bench.iter(|| black_box(badge::evaluate(black_box(&stats), &earned)))
    });
}

criterion_group!(
    benches,
    bench_level_for_xp,
    bench_streak_decision,
    bench_badge_evaluate
);
criterion_main!(benches);
