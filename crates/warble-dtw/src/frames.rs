//! Validated frame sequences (frames × features).

use std::ops::Range;

use crate::error::AlignError;

/// Owned, validated sequence of feature frames. Guaranteed non-empty and
/// rectangular with all values finite.
///
/// Stored row-major: frame `i` occupies `data[i * n_dims .. (i + 1) * n_dims]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    data: Vec<f64>,
    n_frames: usize,
    n_dims: usize,
}

impl FrameSequence {
    /// Create a frame sequence from per-frame rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptySequence`] | `rows` is empty or the first frame has no features |
    /// | [`AlignError::RaggedFrame`] | A frame's length differs from the first frame's |
    /// | [`AlignError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AlignError> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(AlignError::EmptySequence);
        }
        let n_dims = rows[0].len();
        let mut data = Vec::with_capacity(rows.len() * n_dims);
        for (frame, row) in rows.iter().enumerate() {
            if row.len() != n_dims {
                return Err(AlignError::RaggedFrame {
                    frame,
                    expected: n_dims,
                    got: row.len(),
                });
            }
            if let Some(index) = row.iter().position(|v| !v.is_finite()) {
                return Err(AlignError::NonFiniteValue { frame, index });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            n_frames: rows.len(),
            n_dims,
        })
    }

    /// Return the number of frames.
    #[must_use]
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Return the feature dimensionality.
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    /// Return frame `i` as a feature slice.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_frames`.
    #[must_use]
    pub fn frame(&self, i: usize) -> &[f64] {
        assert!(i < self.n_frames, "frame index {i} out of bounds for {} frames", self.n_frames);
        &self.data[i * self.n_dims..(i + 1) * self.n_dims]
    }

    /// Iterate over frames in order.
    pub fn frames(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.n_dims)
    }

    /// Extract a contiguous frame range as a new sequence.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::RangeOutOfBounds`] | `range` is empty or exceeds the sequence |
    pub fn range(&self, range: Range<usize>) -> Result<Self, AlignError> {
        if range.start >= range.end || range.end > self.n_frames {
            return Err(AlignError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                n_frames: self.n_frames,
            });
        }
        let data = self.data[range.start * self.n_dims..range.end * self.n_dims].to_vec();
        Ok(Self {
            n_frames: range.end - range.start,
            n_dims: self.n_dims,
            data,
        })
    }
}
