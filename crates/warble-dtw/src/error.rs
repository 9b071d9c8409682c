//! Error types for similarity construction and pathfinding.

/// Errors from similarity matrix construction, pathfinding, and refinement.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// Returned when a frame sequence contains no frames.
    #[error("frame sequence must contain at least one frame")]
    EmptySequence,

    /// Returned when a frame's feature dimensionality disagrees with the rest
    /// of the sequence.
    #[error("frame {frame} has {got} features, expected {expected}")]
    RaggedFrame {
        /// Index of the offending frame.
        frame: usize,
        /// Dimensionality established by the first frame.
        expected: usize,
        /// Dimensionality actually found.
        got: usize,
    },

    /// Returned when a frame contains NaN or an infinity.
    #[error("non-finite value at frame {frame}, feature {index}")]
    NonFiniteValue {
        /// Frame holding the offending value.
        frame: usize,
        /// Feature index within that frame.
        index: usize,
    },

    /// Returned when two sequences with different feature dimensionalities
    /// are compared.
    #[error("feature dimensionality mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Dimensionality of the first sequence.
        left: usize,
        /// Dimensionality of the second sequence.
        right: usize,
    },

    /// Returned when a frame range lies outside the sequence.
    #[error("frame range {start}..{end} out of bounds for {n_frames} frames")]
    RangeOutOfBounds {
        /// Requested range start.
        start: usize,
        /// Requested range end (exclusive).
        end: usize,
        /// Number of frames in the sequence.
        n_frames: usize,
    },

    /// Returned when pathfinding is attempted on an empty similarity matrix.
    #[error("similarity matrix is empty")]
    EmptyMatrix,

    /// Returned when no alignment path reaches the requested end point.
    #[error("no alignment path reaches ({row}, {col})")]
    NoPath {
        /// End point row.
        row: usize,
        /// End point column.
        col: usize,
    },

    /// Returned when a backtrack walk steps onto a cell with no recorded
    /// direction. Distinct from [`AlignError::NoPath`]: the end point was
    /// reachable, so this indicates a band configuration bug rather than
    /// sparse data.
    #[error("backtrack from ({row}, {col}) stepped onto an invalid cell")]
    CorruptBacktrack {
        /// Row where the walk broke.
        row: usize,
        /// Column where the walk broke.
        col: usize,
    },

    /// Returned when a minimum refinement length of zero is requested.
    #[error("minimum refinement length must be at least 1")]
    InvalidMinLength,

    /// Returned when a silence mask does not cover every frame a path visits.
    #[error("silence mask covers {got} frames but a path references frame {frame}")]
    SilenceMaskTooShort {
        /// Length of the supplied mask.
        got: usize,
        /// First out-of-range frame index encountered.
        frame: usize,
    },

    /// Returned when silence adjustment is requested on an empty path set.
    #[error("silence adjustment requires at least one path")]
    NoPaths,

    /// Returned when a history retention fraction lies outside [0, 1].
    #[error("retention fraction {retention} outside [0, 1]")]
    InvalidRetention {
        /// The rejected value.
        retention: f64,
    },
}
