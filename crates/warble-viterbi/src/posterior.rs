//! Posteriorgram type: per-frame, per-state log-domain scores.

use crate::error::DecodeError;

/// Dense states × frames grid of log-domain scores, as produced by an
/// external frame scorer (Gaussian-mixture log-likelihoods or log
/// posteriors). Validated non-empty, rectangular, and NaN-free; read-only
/// once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Posteriorgram {
    data: Vec<f64>,
    n_states: usize,
    n_frames: usize,
}

impl Posteriorgram {
    /// Create a posteriorgram from per-state rows (each row holds one
    /// state's score per frame).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecodeError::EmptyPosteriorgram`] | No states, or the first state has no frames |
    /// | [`DecodeError::RaggedRow`] | A row's length differs from the first row's |
    /// | [`DecodeError::NanScore`] | Any score is NaN |
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, DecodeError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(DecodeError::EmptyPosteriorgram);
        }
        let n_frames = rows[0].len();
        let mut data = Vec::with_capacity(rows.len() * n_frames);
        for (state, row) in rows.iter().enumerate() {
            if row.len() != n_frames {
                return Err(DecodeError::RaggedRow {
                    state,
                    expected: n_frames,
                    got: row.len(),
                });
            }
            if let Some(frame) = row.iter().position(|v| v.is_nan()) {
                return Err(DecodeError::NanScore { state, frame });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            n_states: rows.len(),
            n_frames,
        })
    }

    /// Return the number of logical states.
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Return the number of frames.
    #[must_use]
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Return the log-domain score of `state` at `frame`.
    ///
    /// # Panics
    ///
    /// Panics if `state >= n_states` or `frame >= n_frames`.
    #[must_use]
    pub fn score(&self, state: usize, frame: usize) -> f64 {
        assert!(
            state < self.n_states && frame < self.n_frames,
            "index ({state}, {frame}) out of bounds"
        );
        self.data[state * self.n_frames + frame]
    }
}
