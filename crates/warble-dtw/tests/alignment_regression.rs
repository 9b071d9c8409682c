//! Alignment regression tests for warble-dtw.
//!
//! These tests pin down end-to-end behavior of the similarity builder, the
//! pathfinders, and refinement. Reference values were computed by hand from
//! the cosine-distance and DP definitions and are hardcoded to catch
//! regressions.

use std::collections::HashSet;

use warble_dtw::{
    AlignmentPath, DiagonalBand, FrameSequence, PathFinder, RefineConfig, SimilarityMatrix,
    raise_silence_cost,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn seq(rows: Vec<Vec<f64>>) -> FrameSequence {
    FrameSequence::from_rows(rows).expect("valid test frames")
}

/// Deterministic multi-dimensional frames tracing overlapping sine arcs.
fn sine_frames(n_frames: usize, n_dims: usize, offset: f64) -> FrameSequence {
    let rows: Vec<Vec<f64>> = (0..n_frames)
        .map(|i| {
            (0..n_dims)
                .map(|d| ((i * (d + 1)) as f64 * 0.07 + offset).sin() + 1.5)
                .collect()
        })
        .collect();
    seq(rows)
}

// ---------------------------------------------------------------------------
// a) cosine_cells_match_known_values
// ---------------------------------------------------------------------------

/// Verify cosine-distance cells against hand-computed references.
#[test]
fn cosine_cells_match_known_values() {
    let a = seq(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    let b = seq(vec![vec![1.0, 0.0], vec![1.0, 1.0]]);
    let sim = SimilarityMatrix::cosine(&a, &b).unwrap();

    // cos = 1 (same direction) -> 0; cos = 1/sqrt(2) -> (1 - 1/sqrt(2)) / 2;
    // cos = 0 (orthogonal) -> 0.5.
    let diag = (1.0 - 1.0 / 2.0_f64.sqrt()) / 2.0; // 0.14644660940672627
    assert!((sim.get(0, 0)).abs() < 1e-12);
    assert!((sim.get(0, 1) - diag).abs() < 1e-12);
    assert!((sim.get(1, 0) - 0.5).abs() < 1e-12);
    assert!((sim.get(1, 1) - diag).abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// b) standard_path_is_monotone_and_corner_to_corner
// ---------------------------------------------------------------------------

/// The unconstrained path must run (0,0) -> (rows-1, cols-1) with both
/// coordinates non-decreasing and steps of at most one cell per move.
#[test]
fn standard_path_is_monotone_and_corner_to_corner() {
    let a = sine_frames(24, 5, 0.0);
    let b = sine_frames(18, 5, 0.4);
    let sim = SimilarityMatrix::cosine(&a, &b).unwrap();
    let path = PathFinder::new(&sim).unwrap().standard().unwrap();

    assert_eq!((path.start().first, path.start().second), (0, 0));
    assert_eq!((path.end().first, path.end().second), (23, 17));
    for w in path.points().windows(2) {
        let df = w[1].first - w[0].first;
        let ds = w[1].second - w[0].second;
        assert!(df <= 1 && ds <= 1, "step larger than one cell");
        assert!(df + ds >= 1, "path stalled");
    }
}

// ---------------------------------------------------------------------------
// c) three_by_three_grid_follows_the_diagonal
// ---------------------------------------------------------------------------

/// On the grid [[0,1,2],[1,0,1],[2,1,0]] the cheapest path is the exact
/// diagonal with total score 0.
#[test]
fn three_by_three_grid_follows_the_diagonal() {
    let sim = SimilarityMatrix::from_raw(
        3,
        3,
        vec![0.0, 1.0, 2.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0],
    );
    let path = PathFinder::new(&sim).unwrap().standard().unwrap();

    let coords: Vec<(usize, usize)> =
        path.points().iter().map(|p| (p.first, p.second)).collect();
    assert_eq!(coords, vec![(0, 0), (1, 1), (2, 2)]);
    assert!(path.total_score().abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// d) segmental_paths_are_banded_and_disjoint
// ---------------------------------------------------------------------------

/// Every segmental path must stay inside the band anchored at its own start,
/// and no cell may belong to two paths (anchors spaced 2*radius+1 apart put
/// the bands on disjoint diagonal ranges).
#[test]
fn segmental_paths_are_banded_and_disjoint() {
    let a = sine_frames(30, 5, 0.0);
    let b = sine_frames(30, 5, 0.9);
    let sim = SimilarityMatrix::cosine(&a, &b).unwrap();
    let radius = 2;
    let paths = PathFinder::new(&sim).unwrap().segmental(radius).unwrap();
    assert!(!paths.is_empty());

    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for path in &paths {
        let start = (path.start().first, path.start().second);
        assert!(
            start.0 == 0 || start.1 == 0,
            "segmental run must anchor on the first row or column"
        );
        let band = DiagonalBand::new(start, radius);
        for point in path.points() {
            assert!(
                band.contains(point.first, point.second),
                "point ({}, {}) escapes the band at {start:?}",
                point.first,
                point.second
            );
            assert!(
                seen.insert((point.first, point.second)),
                "paths overlap at ({}, {})",
                point.first,
                point.second
            );
        }
    }
}

// ---------------------------------------------------------------------------
// e) refinement_matches_exhaustive_window_search
// ---------------------------------------------------------------------------

/// The refined window's average must equal the exhaustive minimum over all
/// windows of admissible length, on a path with a known 4-point core.
#[test]
fn refinement_matches_exhaustive_window_search() {
    let scores = [0.9, 0.8, 0.9, 0.1, 0.05, 0.1, 0.1, 0.9, 0.8, 0.9];
    let path = diagonal_path(&scores);

    let min_length = 4;
    let mut best = f64::INFINITY;
    for s in 0..scores.len() {
        for e in s + min_length - 1..scores.len().min(s + 3 * min_length) {
            best = best.min(scores[s..=e].iter().sum::<f64>() / (e - s + 1) as f64);
        }
    }

    let refined = RefineConfig::new(min_length).unwrap().refine(&path).unwrap();
    assert!((refined.total_score() - best).abs() < 1e-12);
    let firsts: Vec<usize> = refined.points().iter().map(|p| p.first).collect();
    assert_eq!(firsts, vec![3, 4, 5, 6]);
}

/// Paths are only constructed by the pathfinder, so tests that need a
/// synthetic path run the DP on a grid whose diagonal carries the desired
/// scores and everything else is prohibitively expensive.
fn diagonal_path(scores: &[f64]) -> AlignmentPath {
    let n = scores.len();
    let mut data = vec![10.0; n * n];
    for (i, &s) in scores.iter().enumerate() {
        data[i * n + i] = s;
    }
    let sim = SimilarityMatrix::from_raw(n, n, data);
    let path = PathFinder::new(&sim).unwrap().standard().unwrap();
    assert_eq!(path.len(), n, "crafted grid must yield the diagonal");
    path
}

// ---------------------------------------------------------------------------
// f) silence_masking_steers_refinement
// ---------------------------------------------------------------------------

/// Raising silence cost before refinement steers the window away from
/// silent frames that would otherwise look perfectly aligned.
#[test]
fn silence_masking_steers_refinement() {
    // Frames 0-3 are "silence" aligning suspiciously well (score 0.01);
    // frames 4-7 are speech with honest scores.
    let scores = [0.01, 0.01, 0.01, 0.01, 0.2, 0.15, 0.2, 0.9];
    let mut paths = vec![diagonal_path(&scores)];

    let silence = [true, true, true, true, false, false, false, false];
    raise_silence_cost(&mut paths, &silence).unwrap();

    let refined = RefineConfig::new(3).unwrap().refine_all(paths);
    assert_eq!(refined.len(), 1);
    let firsts: Vec<usize> = refined[0].points().iter().map(|p| p.first).collect();
    // The cheapest 3-point window now sits on the speech frames.
    assert_eq!(firsts, vec![4, 5, 6]);
}
