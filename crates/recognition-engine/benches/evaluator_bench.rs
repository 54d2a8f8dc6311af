//! 触发器评估性能基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use recognition_engine::catalog::default_catalog;
use recognition_engine::{TriggerEvaluator, TriggerKind, UserCounters, progress_percentage};
use std::hint::black_box;

fn counters() -> UserCounters {
    UserCounters {
        kudos_received: 42,
        kudos_sent: 17,
        code_reviews: 88,
        pull_requests: 12,
        issues_closed: 9,
        streak_days: 4,
        tenure_days: 400,
        github_commits: 250,
        github_prs: 12,
        github_reviews: 88,
        peer_awards_received: 3,
        peer_awards_given: 1,
        total_badges: 6,
    }
}

/// 单个触发类型评估
fn bench_single_kind(c: &mut Criterion) {
    let mut group = c.benchmark_group("qualifies");
    let evaluator = TriggerEvaluator::new();
    let counters = counters();

    for kind in [
        TriggerKind::KudosReceived,
        TriggerKind::TenureDays,
        TriggerKind::Manual,
        TriggerKind::Unknown("LEGACY".to_string()),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(kind.as_str().to_string()), &kind, |b, kind| {
            b.iter(|| evaluator.qualifies(black_box(kind), black_box(Some(50)), black_box(&counters)))
        });
    }

    group.finish();
}

/// 整个内置目录的一次评估
fn bench_full_catalog(c: &mut Criterion) {
    let evaluator = TriggerEvaluator::new();
    let counters = counters();
    let catalog = default_catalog();

    c.bench_function("full_catalog", |b| {
        b.iter(|| {
            catalog
                .iter()
                .filter(|badge| {
                    evaluator.qualifies(
                        black_box(&badge.trigger_kind),
                        black_box(badge.threshold),
                        black_box(&counters),
                    )
                })
                .count()
        })
    });
}

fn bench_progress(c: &mut Criterion) {
    c.bench_function("progress_percentage", |b| {
        b.iter(|| progress_percentage(black_box(37), black_box(Some(50))))
    });
}

criterion_group!(benches, bench_single_kind, bench_full_catalog, bench_progress);
criterion_main!(benches);
