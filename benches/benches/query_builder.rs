use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use graphql_query_builder::{Arguments, MergingStrategy, QueryBuilder, Variable};
use std::hint::black_box;

const PATHS: &[&str] = &[
    "viewer.login",
    "viewer.name",
    "viewer.avatar:avatarUrl",
    "viewer.repositories.totalCount",
    "viewer.repositories.nodes.name",
    "viewer.repositories.nodes.owner.login",
    "viewer.repositories.nodes.primaryLanguage.name",
    "viewer.repositories.nodes.issues.totalCount",
    "viewer.followers.totalCount",
    "viewer.following.totalCount",
];

fn dashboard(name: &str, strategy: MergingStrategy) -> QueryBuilder {
    let mut builder = QueryBuilder::with_strategy(name, strategy);
    for path in PATHS {
        builder.add_field(path).unwrap();
    }
    builder
        .add_field_with_arguments(
            "viewer.repositories",
            Arguments::new()
                .with("first", 20)
                .with("after", Variable::new("$cursor", "String").unwrap()),
        )
        .unwrap();
    builder
}

/// Path resolution from an empty tree
fn bench_resolve_paths_cold(c: &mut Criterion) {
    c.bench_function("resolve_paths_cold", |b| {
        b.iter(|| black_box(dashboard("Dashboard", MergingStrategy::MergeByDefault)));
    });
}

/// Re-resolving paths that already exist
fn bench_resolve_paths_warm(c: &mut Criterion) {
    c.bench_function("resolve_paths_warm", |b| {
        b.iter_batched(
            || dashboard("Dashboard", MergingStrategy::MergeByDefault),
            |mut builder| {
                for path in PATHS {
                    builder.add_field(path).unwrap();
                }
                black_box(builder)
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_include(c: &mut Criterion) {
    let mut group = c.benchmark_group("include");
    for strategy in [
        MergingStrategy::MergeByDefault,
        MergingStrategy::NeverMerge,
        MergingStrategy::MergeByFieldPath,
    ] {
        let incoming = dashboard("Incoming", strategy);
        group.bench_function(strategy.as_str(), |b| {
            b.iter_batched(
                || dashboard("Root", MergingStrategy::MergeByDefault),
                |mut root| {
                    root.include(&incoming).unwrap();
                    black_box(root)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut root = dashboard("Root", MergingStrategy::NeverMerge);
    for i in 0..10 {
        root.include(&dashboard(&format!("Part{i}"), MergingStrategy::MergeByDefault))
            .unwrap();
    }

    c.bench_function("render_merged", |b| {
        b.iter(|| black_box(root.build()));
    });
}

criterion_group!(
    benches,
    bench_resolve_paths_cold,
    bench_resolve_paths_warm,
    bench_include,
    bench_render,
);

criterion_main!(benches);
