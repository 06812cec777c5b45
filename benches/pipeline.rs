//! Benchmarks for the moddef pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use moddef::syntax::normalize;
use moddef::{load, ContentTree, DefinitionRegistry, Package, Record, SourceFile};

/// `count` units, each with a nested block and a reference to the first.
fn generate_units(count: usize) -> Vec<String> {
    let mut lines = vec![
        "# generated".to_string(),
        "unit:base {".to_string(),
        "  hp = 10".to_string(),
        "}".to_string(),
    ];
    for i in 0..count {
        lines.push(format!("unit:u{} {{", i));
        lines.push(format!("  hp = {}  # comment", i));
        lines.push("  tint = FF8800".to_string());
        lines.push("  armour = @base.hp".to_string());
        lines.push("  stats {".to_string());
        lines.push(format!("    speed = {}.5, 1, 2", i));
        lines.push("  }".to_string());
        lines.push("}".to_string());
    }
    lines
}

fn packages(count: usize) -> Vec<Package> {
    vec![Package::new(
        "bench",
        vec![SourceFile::new("units.txt", generate_units(count))],
    )]
}

// -- Parsing benchmarks --

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    let small = generate_units(10);
    let large = generate_units(1000);

    group.bench_function("normalize_small", |b| b.iter(|| normalize(black_box(&small))));
    group.bench_function("normalize_large", |b| b.iter(|| normalize(black_box(&large))));

    let small_packages = packages(10);
    let large_packages = packages(1000);

    group.bench_function("load_small", |b| {
        b.iter(|| load(black_box(&small_packages)).unwrap())
    });
    group.bench_function("load_large", |b| {
        b.iter(|| load(black_box(&large_packages)).unwrap())
    });

    group.finish();
}

// -- Registry benchmarks --

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");

    let tree: ContentTree = load(&packages(1000)).unwrap().tree;

    group.bench_function("rebuild_fresh", |b| {
        b.iter(|| {
            let mut registry = DefinitionRegistry::<Record>::new("unit");
            registry.rebuild(black_box(&tree)).unwrap();
            registry
        })
    });

    let mut warm = DefinitionRegistry::<Record>::new("unit");
    warm.rebuild(&tree).unwrap();
    group.bench_function("rebuild_stable_ids", |b| {
        b.iter(|| warm.rebuild(black_box(&tree)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_registry);
criterion_main!(benches);
