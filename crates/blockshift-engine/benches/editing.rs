use blockshift_engine::library::paragraph;
use blockshift_engine::{SplitMergeEngine, all_features, builtin_registry};
use criterion::{Criterion, criterion_group, criterion_main};
mod common;

fn bench_split_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_merge");

    let registry = builtin_registry(&all_features).unwrap();
    let engine = SplitMergeEngine::new(&registry);

    for words in [10, 100, 1000] {
        let block = common::block_with(&registry, paragraph::NAME, common::rich_content(words));
        let middle = words * 3;

        group.bench_function(format!("split_at_{words}_words"), |b| {
            b.iter(|| {
                let blocks = engine.split_at(&block, std::hint::black_box(middle));
                std::hint::black_box(blocks)
            });
        });

        let halves = engine.split_at(&block, middle).unwrap();
        group.bench_function(format!("merge_{words}_words"), |b| {
            b.iter(|| {
                let merged = engine.merge(&halves[0], std::hint::black_box(&halves[1]));
                std::hint::black_box(merged)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split_merge);
criterion_main!(benches);
