use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kdtree_knn::{brute_force_knn, KdTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_points(rng: &mut StdRng, n: usize, dim: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(0.0..100.0)).collect())
        .collect()
}

fn benchmark_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let points = random_points(&mut rng, 100_000, 3);

    c.bench_function("build_100000_3d", |b| {
        b.iter(|| black_box(KdTree::new(points.clone(), None).unwrap()))
    });
}

fn benchmark_knn(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let points = random_points(&mut rng, 100_000, 3);
    let queries = random_points(&mut rng, 1000, 3);
    let tree = KdTree::new(points.clone(), None).unwrap();

    c.bench_function("knn_k10_1000_queries", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(tree.knn_neighbors(query, 10).unwrap());
            }
        })
    });

    c.bench_function("knn_batch_k10_1000_queries", |b| {
        b.iter(|| black_box(tree.knn_search_batch(&queries, 10).unwrap()))
    });

    c.bench_function("brute_force_k10_10_queries", |b| {
        b.iter(|| {
            for query in &queries[..10] {
                black_box(brute_force_knn(&points, query, 10));
            }
        })
    });
}

criterion_group!(benches, benchmark_build, benchmark_knn);
criterion_main!(benches);
