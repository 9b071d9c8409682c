//! Expanded-state lattice used by the duration-constrained decoder.
//!
//! Each logical state is represented by `min_frames` contiguous sub-states.
//! Only sub-state 0 may be entered from another state's final sub-state,
//! only the final sub-state may self-loop or exit, and interior sub-states
//! admit only the forced chain from the immediately preceding sub-state —
//! this is the structural invariant enforcing the minimum residency.
//!
//! With a pinned prefix of length L, `L · min_frames` sub-states are
//! prepended ahead of the free states, so the expanded width is
//! `(L + N) · min_frames`.

use crate::posterior::Posteriorgram;
use crate::transition::TransitionMatrix;

/// Sentinel standing in for log(0): cells at or below this score are
/// unreachable, and any finite score dominates it. Keeps every comparison
/// deterministic without true −∞ arithmetic.
pub(crate) const ZERO_LOG: f64 = -1.0e6;

/// Floor applied to per-frame emission scores so that a single vanishing
/// posterior cannot zero out an otherwise good path.
pub(crate) const SCORE_FLOOR: f64 = -50.0;

/// One DP cell: best score into this (sub-state, frame) pair plus the
/// expanded index of the predecessor at the previous frame. `parent` is an
/// arena index, never an owning pointer; frame indices strictly decrease
/// along any backtrack chain, so the walk terminates without cycle checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cell {
    pub(crate) parent: Option<usize>,
    pub(crate) score: f64,
}

impl Cell {
    pub(crate) const UNREACHABLE: Self = Self { parent: None, score: ZERO_LOG };
}

/// Index bookkeeping for the expanded state space.
///
/// The expanded-index → logical-state translation lives in exactly one
/// place ([`Lattice::logical`]) and backs both the emission lookup and the
/// transition lookup, so the prefix/free split cannot drift between them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lattice<'a> {
    pgram: &'a Posteriorgram,
    transition: &'a TransitionMatrix,
    prefix: &'a [usize],
    min_frames: usize,
}

impl<'a> Lattice<'a> {
    pub(crate) fn new(
        pgram: &'a Posteriorgram,
        transition: &'a TransitionMatrix,
        prefix: &'a [usize],
        min_frames: usize,
    ) -> Self {
        Self { pgram, transition, prefix, min_frames }
    }

    /// Total number of expanded sub-states (prefix blocks first).
    pub(crate) fn n_expanded(&self) -> usize {
        (self.pgram.n_states() + self.prefix.len()) * self.min_frames
    }

    /// Number of expanded sub-states occupied by the pinned prefix.
    pub(crate) fn prefix_span(&self) -> usize {
        self.prefix.len() * self.min_frames
    }

    /// Map an expanded index to its logical state: prefix blocks resolve
    /// through the pinned label list, free blocks by offset.
    pub(crate) fn logical(&self, expanded: usize) -> usize {
        let block = expanded / self.min_frames;
        if block < self.prefix.len() {
            self.prefix[block]
        } else {
            block - self.prefix.len()
        }
    }

    /// Sub-state index within the block (0 = entry, `min_frames − 1` = exit).
    pub(crate) fn sub_state(&self, expanded: usize) -> usize {
        expanded % self.min_frames
    }

    /// Floored emission score for an expanded sub-state at a frame.
    pub(crate) fn emission(&self, expanded: usize, frame: usize) -> f64 {
        self.pgram.score(self.logical(expanded), frame).max(SCORE_FLOOR)
    }

    /// Clamped transition cost between two expanded sub-states.
    pub(crate) fn transition_cost(&self, from: usize, to: usize) -> f64 {
        self.transition
            .cost(self.logical(from), self.logical(to))
            .max(ZERO_LOG)
    }
}
