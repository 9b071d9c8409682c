//! Criterion benchmarks for warble-dtw: similarity matrix construction,
//! standard and segmental pathfinding, and path refinement.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use warble_dtw::{FrameSequence, PathFinder, RefineConfig, SimilarityMatrix};

fn make_sine_frames(n_frames: usize, n_dims: usize, offset: f64) -> FrameSequence {
    let rows: Vec<Vec<f64>> = (0..n_frames)
        .map(|i| {
            (0..n_dims)
                .map(|d| ((i + d) as f64 * 0.1 + offset).sin())
                .collect()
        })
        .collect();
    FrameSequence::from_rows(rows).unwrap()
}

fn bench_cosine_similarity(c: &mut Criterion) {
    let sizes = [64usize, 256, 1024];
    let mut group = c.benchmark_group("cosine_similarity");

    for &n in &sizes {
        let a = make_sine_frames(n, 13, 0.0);
        let b = make_sine_frames(n, 13, 0.5);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| SimilarityMatrix::cosine(a, b).unwrap());
        });
    }

    group.finish();
}

fn bench_pathfinding(c: &mut Criterion) {
    let a = make_sine_frames(256, 13, 0.0);
    let b = make_sine_frames(256, 13, 0.5);
    let sim = SimilarityMatrix::cosine(&a, &b).unwrap();

    c.bench_function("standard_path_256x256", |bencher| {
        bencher.iter(|| PathFinder::new(&sim).unwrap().standard().unwrap());
    });

    let radii = [2usize, 10];
    let mut group = c.benchmark_group("segmental_paths_256x256");
    for &radius in &radii {
        group.bench_with_input(
            BenchmarkId::new("radius", radius),
            &radius,
            |bencher, &radius| {
                bencher.iter(|| PathFinder::new(&sim).unwrap().segmental(radius).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_refinement(c: &mut Criterion) {
    let a = make_sine_frames(512, 13, 0.0);
    let b = make_sine_frames(512, 13, 0.5);
    let sim = SimilarityMatrix::cosine(&a, &b).unwrap();
    let paths = PathFinder::new(&sim).unwrap().segmental(5).unwrap();
    let config = RefineConfig::new(20).unwrap().with_expansion_factor(0.5);

    c.bench_function("refine_all_512x512_r5", |bencher| {
        bencher.iter(|| config.refine_all(paths.clone()));
    });
}

criterion_group!(
    benches,
    bench_cosine_similarity,
    bench_pathfinding,
    bench_refinement
);
criterion_main!(benches);
