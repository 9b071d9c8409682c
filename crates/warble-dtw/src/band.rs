//! Diagonal band constraint for segmental DTW runs.

/// A band of cells within `radius` of the diagonal through a run's start
/// point: `(r, c)` is admissible iff
/// `|(r − start.0) − (c − start.1)| <= radius`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagonalBand {
    start: (usize, usize),
    radius: usize,
}

impl DiagonalBand {
    /// Create a band anchored at `start` with the given radius.
    #[must_use]
    pub fn new(start: (usize, usize), radius: usize) -> Self {
        Self { start, radius }
    }

    /// Return the run's start point.
    #[must_use]
    pub fn start(&self) -> (usize, usize) {
        self.start
    }

    /// Return the band radius.
    #[must_use]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Return true if `(row, col)` lies within the band. Signed arithmetic
    /// throughout: coordinates before the start point are legal inputs and
    /// must not wrap.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let dr = row as i64 - self.start.0 as i64;
        let dc = col as i64 - self.start.1 as i64;
        (dr - dc).unsigned_abs() <= self.radius as u64
    }
}
