//! Error types for duration-constrained decoding.

/// Errors from posteriorgram validation and Viterbi decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Returned when a posteriorgram has no states or no frames.
    #[error("posteriorgram must have at least one state and one frame")]
    EmptyPosteriorgram,

    /// Returned when a posteriorgram row's length differs from the first row's.
    #[error("state {state} has {got} frames, expected {expected}")]
    RaggedRow {
        /// Index of the offending state row.
        state: usize,
        /// Frame count established by the first row.
        expected: usize,
        /// Frame count actually found.
        got: usize,
    },

    /// Returned when a score is NaN. Negative infinity is admitted (it is
    /// clamped to the unreachable sentinel at use).
    #[error("NaN score at state {state}, frame {frame}")]
    NanScore {
        /// State row holding the NaN.
        state: usize,
        /// Frame column holding the NaN.
        frame: usize,
    },

    /// Returned when a transition matrix is not square.
    #[error("transition matrix row {row} has {got} entries, expected {expected}")]
    NonSquareTransition {
        /// Index of the offending row.
        row: usize,
        /// Entry count required for squareness.
        expected: usize,
        /// Entry count actually found.
        got: usize,
    },

    /// Returned when a self-loop probability lies outside (0, 1).
    #[error("self-loop probability {prob} outside the open interval (0, 1)")]
    InvalidSelfLoop {
        /// The rejected probability.
        prob: f64,
    },

    /// Returned when the posteriorgram's state count disagrees with the
    /// transition matrix's.
    #[error("posteriorgram has {pgram} states but transition matrix has {transition}")]
    StateCountMismatch {
        /// Logical state count of the posteriorgram.
        pgram: usize,
        /// Size of the transition matrix.
        transition: usize,
    },

    /// Returned when a minimum residency of zero frames is requested.
    #[error("minimum residency must be at least 1 frame")]
    InvalidMinFrames,

    /// Returned when a pinned prefix names a state the posteriorgram lacks.
    #[error("prefix state {state} out of range for {n_states} states")]
    PrefixStateOutOfRange {
        /// The offending prefix entry.
        state: usize,
        /// Logical state count of the posteriorgram.
        n_states: usize,
    },

    /// Returned when no label sequence satisfies the duration constraint,
    /// e.g. fewer frames than the minimum residency.
    #[error("no label sequence satisfies the duration constraint")]
    NoValidPath,

    /// Returned when consensus decoding is requested over an empty set.
    #[error("consensus decoding requires at least one posteriorgram")]
    EmptySet,
}
