//! Banded DTW pathfinding over a similarity matrix.

use tracing::{debug, instrument};

use crate::band::DiagonalBand;
use crate::error::AlignError;
use crate::path::{AlignmentPath, PathPoint};
use crate::similarity::SimilarityMatrix;

/// Direction tag recorded per DP cell for backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// No valid path reaches this cell.
    Invalid,
    /// Predecessor is one step back in the first dimension (row − 1).
    FirstDim,
    /// Predecessor is one step back in the second dimension (col − 1).
    SecondDim,
    /// Predecessor is one step back in both dimensions.
    Diagonal,
    /// The run's start cell.
    Origin,
}

/// Pathfinder over a borrowed similarity matrix.
///
/// One instance can serve any number of runs; each run allocates its own DP
/// and direction grids and releases them on return.
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    sim: &'a SimilarityMatrix,
}

impl<'a> PathFinder<'a> {
    /// Create a pathfinder over a similarity matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptyMatrix`] | The matrix has no rows or no columns |
    pub fn new(sim: &'a SimilarityMatrix) -> Result<Self, AlignError> {
        if sim.is_empty() {
            return Err(AlignError::EmptyMatrix);
        }
        Ok(Self { sim })
    }

    /// Compute the standard corner-to-corner DTW path: a single run from
    /// `(0, 0)` to `(rows − 1, cols − 1)` with the band wide enough to admit
    /// every cell.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::NoPath`] | No path reaches the far corner (cannot occur with the unconstrained band) |
    /// | [`AlignError::CorruptBacktrack`] | Internal inconsistency in the direction grid |
    #[instrument(skip(self), fields(rows = self.sim.rows(), cols = self.sim.cols()))]
    pub fn standard(&self) -> Result<AlignmentPath, AlignError> {
        let rows = self.sim.rows();
        let cols = self.sim.cols();
        let end = (rows - 1, cols - 1);
        let band = DiagonalBand::new((0, 0), rows + cols);
        self.run(end, band)?
            .ok_or(AlignError::NoPath { row: end.0, col: end.1 })
    }

    /// Compute the set of banded segmental DTW paths.
    ///
    /// A run is anchored every `2·radius + 1` cells along the first column,
    /// then along the first row (skipping the corner already covered). Each
    /// run ends on the diagonal implied by its start, clipped to the shorter
    /// matrix dimension. Runs occupy disjoint diagonal bands, so no two
    /// returned paths can share a coordinate. Runs whose end point is
    /// unreachable contribute no path; callers must check the result count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::CorruptBacktrack`] | Internal inconsistency in a direction grid |
    #[instrument(skip(self), fields(rows = self.sim.rows(), cols = self.sim.cols()))]
    pub fn segmental(&self, radius: usize) -> Result<Vec<AlignmentPath>, AlignError> {
        let rows = self.sim.rows();
        let cols = self.sim.cols();
        let interval = 2 * radius + 1;
        let mut paths = Vec::new();

        // Starts along the first column. When the matrix is not square the
        // first run may differ from the standard corner-to-corner path.
        for r in (0..rows).step_by(interval) {
            let diagonal = (rows - r).min(cols);
            let end = (r + diagonal - 1, diagonal - 1);
            let band = DiagonalBand::new((r, 0), radius);
            if let Some(path) = self.run(end, band)? {
                paths.push(path);
            }
        }
        // Starts along the first row, skipping the run anchored at (0, 0).
        for c in (interval..cols).step_by(interval) {
            let diagonal = (cols - c).min(rows);
            let end = (diagonal - 1, c + diagonal - 1);
            let band = DiagonalBand::new((0, c), radius);
            if let Some(path) = self.run(end, band)? {
                paths.push(path);
            }
        }

        debug!(n_paths = paths.len(), radius, "segmental DTW complete");
        Ok(paths)
    }

    /// One banded DP run from the band's start point to `end`.
    ///
    /// Returns `Ok(None)` when `end` is unreachable — outside the band, or
    /// inside it but cut off. `Err(CorruptBacktrack)` means the direction
    /// grid claimed `end` reachable and then broke mid-walk, which indicates
    /// a band configuration bug rather than sparse data.
    fn run(
        &self,
        end: (usize, usize),
        band: DiagonalBand,
    ) -> Result<Option<AlignmentPath>, AlignError> {
        let rows = self.sim.rows();
        let cols = self.sim.cols();
        let start = band.start();

        let mut dp = vec![f64::INFINITY; rows * cols];
        let mut steps = vec![Step::Invalid; rows * cols];
        let idx = |r: usize, c: usize| r * cols + c;

        for r in start.0..rows {
            for c in start.1..cols {
                if !band.contains(r, c) {
                    continue;
                }
                if (r, c) == start {
                    dp[idx(r, c)] = self.sim.get(r, c);
                    steps[idx(r, c)] = Step::Origin;
                    continue;
                }
                // Predecessors must themselves be reachable: an Invalid tag
                // propagates unreachability through the band instead of
                // treating cut-off cells as zero-cost.
                let mut best = f64::INFINITY;
                let mut dir = Step::Invalid;
                if r > start.0 && steps[idx(r - 1, c)] != Step::Invalid && dp[idx(r - 1, c)] < best
                {
                    best = dp[idx(r - 1, c)];
                    dir = Step::FirstDim;
                }
                if c > start.1 && steps[idx(r, c - 1)] != Step::Invalid && dp[idx(r, c - 1)] < best
                {
                    best = dp[idx(r, c - 1)];
                    dir = Step::SecondDim;
                }
                if r > start.0
                    && c > start.1
                    && steps[idx(r - 1, c - 1)] != Step::Invalid
                    && dp[idx(r - 1, c - 1)] < best
                {
                    best = dp[idx(r - 1, c - 1)];
                    dir = Step::Diagonal;
                }
                if dir == Step::Invalid {
                    continue; // No reachable predecessor; cell stays invalid.
                }
                dp[idx(r, c)] = self.sim.get(r, c) + best;
                steps[idx(r, c)] = dir;
            }
        }

        if steps[idx(end.0, end.1)] == Step::Invalid {
            return Ok(None);
        }

        // Walk direction tags from the end point back to the origin. Both
        // coordinates are non-increasing, so the walk terminates.
        let mut points = Vec::new();
        let (mut r, mut c) = end;
        loop {
            points.push(PathPoint { first: r, second: c, score: self.sim.get(r, c) });
            match steps[idx(r, c)] {
                Step::Origin => break,
                Step::FirstDim => r -= 1,
                Step::SecondDim => c -= 1,
                Step::Diagonal => {
                    r -= 1;
                    c -= 1;
                }
                Step::Invalid => {
                    return Err(AlignError::CorruptBacktrack { row: r, col: c });
                }
            }
        }
        points.reverse();
        Ok(Some(AlignmentPath::new(points, dp[idx(end.0, end.1)])))
    }
}
