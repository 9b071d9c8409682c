//! Similarity matrix construction.

use rayon::prelude::*;
use tracing::instrument;

use crate::error::AlignError;
use crate::frames::FrameSequence;

/// Dense grid of per-frame-pair distances. For DTW use, lower = more similar
/// (a true distance); for state similarity, values lie in [0, 1] with
/// 1 = most similar.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build a frame-distance grid from two sequences using normalized cosine
    /// distance: `cell(i, j) = 1 − (cos(aᵢ, bⱼ) + 1) / 2`, in [0, 1] with
    /// 0 = identical direction. A zero-magnitude frame has no cosine
    /// direction and scores the neutral 0.5 against everything.
    ///
    /// Rows are computed in parallel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::DimensionMismatch`] | `a` and `b` have different feature dimensionalities |
    #[instrument(skip(a, b), fields(rows = a.n_frames(), cols = b.n_frames()))]
    pub fn cosine(a: &FrameSequence, b: &FrameSequence) -> Result<Self, AlignError> {
        if a.n_dims() != b.n_dims() {
            return Err(AlignError::DimensionMismatch {
                left: a.n_dims(),
                right: b.n_dims(),
            });
        }
        let rows = a.n_frames();
        let cols = b.n_frames();

        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map_iter(|r| {
                let fa = a.frame(r);
                (0..cols).map(move |c| cosine_distance(fa, b.frame(c)))
            })
            .collect();

        Ok(Self { rows, cols, data })
    }

    /// Build a symmetric state-similarity grid from a divergence function.
    ///
    /// Only the upper triangle of `divergence` is evaluated. Values are
    /// rescaled to [0, 1] as `1 − d / max_d`, so the diagonal (divergence 0)
    /// maps to exactly 1, the most-similar extreme. If every divergence is
    /// zero the whole grid is 1.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptyMatrix`] | `n` is zero |
    pub fn state_similarity<F>(n: usize, divergence: F) -> Result<Self, AlignError>
    where
        F: Fn(usize, usize) -> f64,
    {
        if n == 0 {
            return Err(AlignError::EmptyMatrix);
        }
        let mut data = vec![0.0; n * n];
        let mut max_divergence = 0.0_f64;
        for r in 0..n {
            for c in r..n {
                let d = divergence(r, c);
                data[r * n + c] = d;
                max_divergence = max_divergence.max(d);
            }
        }
        for r in 0..n {
            for c in r..n {
                let s = if max_divergence > 0.0 {
                    1.0 - data[r * n + c] / max_divergence
                } else {
                    1.0
                };
                data[r * n + c] = s;
                data[c * n + r] = s;
            }
        }
        Ok(Self { rows: n, cols: n, data })
    }

    /// Pull the similarity of a state pair toward the most-similar extreme:
    /// `s ← retention · s + (1 − retention)`, applied symmetrically. A
    /// retention of 1 leaves the pair unchanged; 0 forces it to 1.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidRetention`] | `retention` outside [0, 1] |
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of bounds.
    pub fn blend_pair(&mut self, i: usize, j: usize, retention: f64) -> Result<(), AlignError> {
        if !(0.0..=1.0).contains(&retention) {
            return Err(AlignError::InvalidRetention { retention });
        }
        let blended = retention * self.get(i, j) + (1.0 - retention);
        self.data[i * self.cols + j] = blended;
        self.data[j * self.cols + i] = blended;
        Ok(())
    }

    /// Create a matrix from pre-computed row-major data.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    #[must_use]
    pub fn from_raw(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "data length must equal rows * cols");
        Self { rows, cols, data }
    }

    /// Return the cell at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows` or `col >= cols`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of bounds");
        self.data[row * self.cols + col]
    }

    /// Return the number of rows (frames of the first sequence).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the number of columns (frames of the second sequence).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return true if the matrix has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Return the maximum cell value, or 0 for an empty matrix.
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }
}

fn cosine_distance(one: &[f64], two: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut mag_one = 0.0;
    let mut mag_two = 0.0;
    for (a, b) in one.iter().zip(two.iter()) {
        dot += a * b;
        mag_one += a * a;
        mag_two += b * b;
    }
    let denom = (mag_one.sqrt()) * (mag_two.sqrt());
    let cos = if denom > 0.0 { dot / denom } else { 0.0 };
    1.0 - (cos + 1.0) / 2.0
}
