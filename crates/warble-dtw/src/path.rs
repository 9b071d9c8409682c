//! Alignment path types and score adjustments.

use crate::error::AlignError;

/// A single coordinate in an alignment path, mapping frame `first` of the
/// first sequence to frame `second` of the second, plus the local cell score
/// at that coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    /// Frame index into the first sequence.
    pub first: usize,
    /// Frame index into the second sequence.
    pub second: usize,
    /// Local similarity score at this coordinate.
    pub score: f64,
}

/// An ordered alignment path, monotonically non-decreasing in both
/// coordinates, with an aggregate score.
///
/// Produced by the pathfinder (where `total_score` is the accumulated DP
/// value) and mutated only by refinement (where it becomes the refined
/// window's average score).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPath {
    points: Vec<PathPoint>,
    total_score: f64,
}

impl AlignmentPath {
    pub(crate) fn new(points: Vec<PathPoint>, total_score: f64) -> Self {
        debug_assert!(!points.is_empty(), "a path must contain at least one point");
        Self { points, total_score }
    }

    /// Return the path points in order.
    #[must_use]
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// Return the aggregate path score.
    #[must_use]
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    /// Return the number of points in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Return true if the path has no points. Paths created by the
    /// pathfinder always have at least one point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Return the first point of the path.
    #[must_use]
    pub fn start(&self) -> PathPoint {
        self.points[0]
    }

    /// Return the last point of the path.
    #[must_use]
    pub fn end(&self) -> PathPoint {
        self.points[self.points.len() - 1]
    }

    pub(crate) fn points_mut(&mut self) -> &mut [PathPoint] {
        &mut self.points
    }
}

/// Overwrite the score of every path point whose first-sequence frame is
/// silent with the maximum point score observed in the first path.
///
/// Silence tends to align to silence with a near-perfect score, so this
/// uniformly penalizes silence-containing alignments without re-running the
/// DP. Must run before refinement, which is score-driven.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AlignError::NoPaths`] | `paths` is empty |
/// | [`AlignError::SilenceMaskTooShort`] | A path references a frame past the end of `silence` |
pub fn raise_silence_cost(
    paths: &mut [AlignmentPath],
    silence: &[bool],
) -> Result<(), AlignError> {
    let Some(first) = paths.first() else {
        return Err(AlignError::NoPaths);
    };
    let max_score = first
        .points()
        .iter()
        .map(|p| p.score)
        .fold(f64::NEG_INFINITY, f64::max);

    for path in paths.iter_mut() {
        for point in path.points_mut() {
            if point.first >= silence.len() {
                return Err(AlignError::SilenceMaskTooShort {
                    got: silence.len(),
                    frame: point.first,
                });
            }
            if silence[point.first] {
                point.score = max_score;
            }
        }
    }
    Ok(())
}

/// Return, per frame of the first sequence, the total score of the best
/// (lowest-cost) path covering that frame. Frames covered by no path receive
/// the worst total score in the set.
#[must_use]
pub fn best_score_per_frame(paths: &[AlignmentPath], n_frames: usize) -> Vec<f64> {
    let mut result: Vec<Option<f64>> = vec![None; n_frames];
    let mut worst = 0.0_f64;
    for path in paths {
        let score = path.total_score();
        worst = worst.max(score);
        for point in path.points() {
            if point.first < n_frames {
                let entry = &mut result[point.first];
                *entry = Some(entry.map_or(score, |s| s.min(score)));
            }
        }
    }
    result.into_iter().map(|s| s.unwrap_or(worst)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(scores: &[f64], total: f64) -> AlignmentPath {
        let points = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| PathPoint { first: i, second: i, score })
            .collect();
        AlignmentPath::new(points, total)
    }

    #[test]
    fn accessors() {
        let p = path(&[0.1, 0.2, 0.3], 0.6);
        assert_eq!(p.len(), 3);
        assert!(!p.is_empty());
        assert_eq!(p.start().first, 0);
        assert_eq!(p.end().first, 2);
        assert!((p.total_score() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn silence_cost_uses_first_path_maximum() {
        let mut paths = vec![path(&[0.1, 0.9, 0.2], 1.2), path(&[0.3, 0.3, 0.3], 0.9)];
        raise_silence_cost(&mut paths, &[true, false, true]).unwrap();
        // Max score in the first path is 0.9.
        assert!((paths[0].points()[0].score - 0.9).abs() < 1e-12);
        assert!((paths[0].points()[1].score - 0.9).abs() < 1e-12); // untouched, already 0.9
        assert!((paths[0].points()[2].score - 0.9).abs() < 1e-12);
        assert!((paths[1].points()[0].score - 0.9).abs() < 1e-12);
        assert!((paths[1].points()[1].score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn silence_cost_rejects_empty_set() {
        assert!(matches!(
            raise_silence_cost(&mut [], &[true]),
            Err(AlignError::NoPaths)
        ));
    }

    #[test]
    fn silence_cost_rejects_short_mask() {
        let mut paths = vec![path(&[0.1, 0.2], 0.3)];
        assert!(matches!(
            raise_silence_cost(&mut paths, &[false]),
            Err(AlignError::SilenceMaskTooShort { got: 1, frame: 1 })
        ));
    }

    #[test]
    fn best_score_per_frame_picks_lowest_and_fills_gaps() {
        let a = AlignmentPath::new(
            vec![
                PathPoint { first: 0, second: 0, score: 0.0 },
                PathPoint { first: 1, second: 1, score: 0.0 },
            ],
            2.0,
        );
        let b = AlignmentPath::new(
            vec![
                PathPoint { first: 1, second: 0, score: 0.0 },
                PathPoint { first: 2, second: 1, score: 0.0 },
            ],
            5.0,
        );
        let scores = best_score_per_frame(&[a, b], 4);
        assert_eq!(scores, vec![2.0, 2.0, 5.0, 5.0]);
    }
}
