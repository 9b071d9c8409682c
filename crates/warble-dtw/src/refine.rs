//! Path refinement: length-constrained minimum-average windows plus greedy
//! boundary extension.

use tracing::{debug, instrument};

use crate::error::AlignError;
use crate::path::{AlignmentPath, PathPoint};

/// Configuration for path refinement.
///
/// Construct via [`RefineConfig::new`], then chain `with_*` methods to
/// override defaults.
///
/// # Defaults
///
/// | Parameter          | Default            |
/// |--------------------|--------------------|
/// | `expansion_factor` | −1.0 (no extension) |
#[derive(Debug, Clone, Copy)]
pub struct RefineConfig {
    min_length: usize,
    expansion_factor: f64,
}

impl RefineConfig {
    /// Create a refinement configuration with the given minimum window
    /// length.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidMinLength`] | `min_length` is zero |
    pub fn new(min_length: usize) -> Result<Self, AlignError> {
        if min_length == 0 {
            return Err(AlignError::InvalidMinLength);
        }
        Ok(Self { min_length, expansion_factor: -1.0 })
    }

    /// Set the expansion factor. After the best window is found, its edges
    /// are greedily extended while the running average stays within
    /// `(1 + factor) × window_average`. Negative values disable extension.
    #[must_use]
    pub fn with_expansion_factor(mut self, factor: f64) -> Self {
        self.expansion_factor = factor;
        self
    }

    /// Refine a path to its best minimum-average window.
    ///
    /// Returns `None` when the path is shorter than the minimum window
    /// length. Otherwise the returned path is trimmed to the window and its
    /// `total_score` is the window's average point score.
    #[must_use]
    pub fn refine(&self, path: &AlignmentPath) -> Option<AlignmentPath> {
        let points = path.points();
        let (mut start, mut end, mut mean) = best_window(points, self.min_length)?;
        if self.expansion_factor >= 0.0 {
            (start, end, mean) = extend_window(points, start, end, mean, self.expansion_factor);
        }
        Some(AlignmentPath::new(points[start..=end].to_vec(), mean))
    }

    /// Refine every path in a set, discarding paths shorter than the minimum
    /// window length.
    #[must_use]
    #[instrument(skip(self, paths), fields(n_paths = paths.len(), min_length = self.min_length))]
    pub fn refine_all(&self, paths: Vec<AlignmentPath>) -> Vec<AlignmentPath> {
        let kept: Vec<AlignmentPath> =
            paths.iter().filter_map(|p| self.refine(p)).collect();
        debug!(kept = kept.len(), "refinement complete");
        kept
    }
}

/// Length-constrained minimum-average window search.
///
/// For every start index the window end is capped at `3 × min_length` points;
/// windows longer than that are unlikely to win in practice and the cap keeps
/// the search O(len × min_length). Within a start the mean is maintained
/// incrementally rather than recomputed. Asymptotically faster algorithms
/// exist (Lin, Jiang & Chao 2002) but the cap makes them unnecessary here.
fn best_window(points: &[PathPoint], min_length: usize) -> Option<(usize, usize, f64)> {
    if points.len() < min_length {
        return None;
    }
    let mut best: Option<(usize, usize, f64)> = None;
    for s in 0..=(points.len() - min_length) {
        let cap = (s + 3 * min_length).min(points.len());
        let first_end = s + min_length - 1;
        let mut mean = points[s..=first_end].iter().map(|p| p.score).sum::<f64>()
            / min_length as f64;
        if best.is_none_or(|(_, _, m)| mean < m) {
            best = Some((s, first_end, mean));
        }
        for e in (first_end + 1)..cap {
            let k = (e - s) as f64;
            mean = (k / (k + 1.0)) * mean + points[e].score / (k + 1.0);
            if best.is_none_or(|(_, _, m)| mean < m) {
                best = Some((s, e, mean));
            }
        }
    }
    best
}

/// Greedily extend a window outward, preferring whichever neighboring point
/// has the lower score, while the running average stays within
/// `(1 + factor) × original average`. A step that would push the average past
/// the limit is not taken. Extension stops at the path boundaries.
fn extend_window(
    points: &[PathPoint],
    mut start: usize,
    mut end: usize,
    mut mean: f64,
    factor: f64,
) -> (usize, usize, f64) {
    let limit = (1.0 + factor) * mean;
    loop {
        if start == 0 && end == points.len() - 1 {
            return (start, end, mean); // Window covers the whole path.
        }
        let extend_start = if start == 0 {
            false
        } else if end == points.len() - 1 {
            true
        } else {
            points[start - 1].score < points[end + 1].score
        };

        let candidate_score = if extend_start {
            points[start - 1].score
        } else {
            points[end + 1].score
        };
        let len = (end - start + 1) as f64;
        let candidate_mean = (len / (len + 1.0)) * mean + candidate_score / (len + 1.0);
        if candidate_mean > limit {
            return (start, end, mean);
        }
        if extend_start {
            start -= 1;
        } else {
            end += 1;
        }
        mean = candidate_mean;
    }
}
