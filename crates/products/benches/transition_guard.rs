use criterion::{Criterion, black_box, criterion_group, criterion_main};

use storefront_products::{ProductStatus, allowed_targets, evaluate, evaluate_tokens};

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_guard");

    group.bench_function("evaluate_all_pairs", |b| {
        b.iter(|| {
            for from in ProductStatus::ALL {
                for to in ProductStatus::ALL {
                    black_box(evaluate(black_box(from), black_box(to)));
                }
            }
        })
    });

    group.bench_function("evaluate_tokens", |b| {
        b.iter(|| black_box(evaluate_tokens(black_box("disabled"), black_box("draft"))))
    });

    group.bench_function("allowed_targets", |b| {
        b.iter(|| black_box(allowed_targets(black_box(ProductStatus::Active))))
    });

    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
