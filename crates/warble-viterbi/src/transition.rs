//! Inter-state transition cost matrix.

use crate::error::DecodeError;

/// Square log-domain matrix of inter-state transition costs. The diagonal
/// holds the self-loop cost.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    data: Vec<f64>,
    n: usize,
}

impl TransitionMatrix {
    /// Create a transition matrix from row-major rows.
    ///
    /// Negative infinity entries are admitted (a forbidden transition) and
    /// clamped to the unreachable sentinel during decoding.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecodeError::EmptyPosteriorgram`] | `rows` is empty |
    /// | [`DecodeError::NonSquareTransition`] | A row's length differs from the row count |
    /// | [`DecodeError::NanScore`] | Any entry is NaN |
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, DecodeError> {
        if rows.is_empty() {
            return Err(DecodeError::EmptyPosteriorgram);
        }
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n {
                return Err(DecodeError::NonSquareTransition {
                    row,
                    expected: n,
                    got: values.len(),
                });
            }
            if let Some(frame) = values.iter().position(|v| v.is_nan()) {
                return Err(DecodeError::NanScore { state: row, frame });
            }
            data.extend_from_slice(values);
        }
        Ok(Self { data, n })
    }

    /// Create a uniform matrix: `ln(self_loop_prob)` on the diagonal and
    /// `ln(1 − self_loop_prob)` everywhere else.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecodeError::EmptyPosteriorgram`] | `n` is zero |
    /// | [`DecodeError::InvalidSelfLoop`] | `self_loop_prob` outside (0, 1) |
    pub fn uniform(n: usize, self_loop_prob: f64) -> Result<Self, DecodeError> {
        if n == 0 {
            return Err(DecodeError::EmptyPosteriorgram);
        }
        if !(self_loop_prob > 0.0 && self_loop_prob < 1.0) {
            return Err(DecodeError::InvalidSelfLoop { prob: self_loop_prob });
        }
        let log_self = self_loop_prob.ln();
        let log_cross = (1.0 - self_loop_prob).ln();
        let mut data = vec![log_cross; n * n];
        for i in 0..n {
            data[i * n + i] = log_self;
        }
        Ok(Self { data, n })
    }

    /// Return the number of logical states.
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.n
    }

    /// Return the log-domain cost of moving from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn cost(&self, from: usize, to: usize) -> f64 {
        assert!(from < self.n && to < self.n, "index ({from}, {to}) out of bounds");
        self.data[from * self.n + to]
    }
}
