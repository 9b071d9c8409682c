//! Duration-constrained Viterbi decoding.

use tracing::{debug, instrument};

use crate::error::DecodeError;
use crate::lattice::{Cell, Lattice, ZERO_LOG};
use crate::posterior::Posteriorgram;
use crate::transition::TransitionMatrix;

/// Result of one decode: the label run sequence (consecutive repeats
/// collapsed), the per-frame label assignment, and the endpoint score.
#[derive(Debug, Clone, PartialEq)]
pub struct Decode {
    /// Logical-state indices, one entry per contiguous run.
    pub labels: Vec<usize>,
    /// Logical-state index assigned to each frame.
    pub frame_labels: Vec<usize>,
    /// Log-domain score of the winning path.
    pub score: f64,
}

/// Viterbi decoder enforcing a minimum per-label residency of `min_frames`
/// consecutive frames, via the expanded sub-state lattice.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    min_frames: usize,
}

impl Decoder {
    /// Create a decoder with the given minimum residency.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecodeError::InvalidMinFrames`] | `min_frames` is zero |
    pub fn new(min_frames: usize) -> Result<Self, DecodeError> {
        if min_frames == 0 {
            return Err(DecodeError::InvalidMinFrames);
        }
        Ok(Self { min_frames })
    }

    /// Return the minimum residency in frames.
    #[must_use]
    pub fn min_frames(&self) -> usize {
        self.min_frames
    }

    /// Free decode: best label sequence over all logical states.
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode_restricted`].
    pub fn decode(
        &self,
        pgram: &Posteriorgram,
        transition: &TransitionMatrix,
    ) -> Result<Decode, DecodeError> {
        self.decode_restricted(pgram, transition, &[], false)
    }

    /// Decode with a pinned label prefix.
    ///
    /// With a non-empty `prefix`, frame 0 starts at the prefix's first
    /// sub-state only and the path must consume the prefix blocks in order
    /// before reaching any free state. `force_align` additionally pins the
    /// endpoint to the final sub-state of the last prefix block, so the
    /// returned score is the forced-alignment score of `prefix` itself.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecodeError::StateCountMismatch`] | Posteriorgram and transition matrix disagree on the state count |
    /// | [`DecodeError::PrefixStateOutOfRange`] | A prefix entry names a state the posteriorgram lacks |
    /// | [`DecodeError::NoValidPath`] | No endpoint satisfies the duration constraint, e.g. fewer frames than `min_frames` |
    #[instrument(skip_all, fields(
        states = pgram.n_states(),
        frames = pgram.n_frames(),
        prefix_len = prefix.len(),
        force_align,
    ))]
    pub fn decode_restricted(
        &self,
        pgram: &Posteriorgram,
        transition: &TransitionMatrix,
        prefix: &[usize],
        force_align: bool,
    ) -> Result<Decode, DecodeError> {
        if pgram.n_states() != transition.n_states() {
            return Err(DecodeError::StateCountMismatch {
                pgram: pgram.n_states(),
                transition: transition.n_states(),
            });
        }
        if let Some(&state) = prefix.iter().find(|&&s| s >= pgram.n_states()) {
            return Err(DecodeError::PrefixStateOutOfRange {
                state,
                n_states: pgram.n_states(),
            });
        }

        let lattice = Lattice::new(pgram, transition, prefix, self.min_frames);
        let n_expanded = lattice.n_expanded();
        let n_frames = pgram.n_frames();
        let prefix_span = lattice.prefix_span();
        let exit = self.min_frames - 1;
        // Final sub-state of the last prefix block, or of the first free
        // block when no prefix is pinned. Cross-entries into free states
        // and the endpoint scan both start here.
        let first_exit = prefix.len().saturating_sub(1) * self.min_frames + exit;

        let mut cells = vec![Cell::UNREACHABLE; n_expanded * n_frames];

        if prefix.is_empty() {
            for s in (0..n_expanded).step_by(self.min_frames) {
                cells[s] = Cell { parent: None, score: lattice.emission(s, 0) };
            }
        } else {
            cells[0] = Cell { parent: None, score: lattice.emission(0, 0) };
        }

        for f in 1..n_frames {
            let (done, rest) = cells.split_at_mut(f * n_expanded);
            let prev = &done[(f - 1) * n_expanded..];
            let cur = &mut rest[..n_expanded];
            for s in 0..n_expanded {
                let mut best = Cell::UNREACHABLE;
                // Forced chain: interior sub-states advance from the
                // immediately preceding sub-state; across a prefix block
                // boundary this is the pinned prefix transition.
                let chained = if s < prefix_span { s > 0 } else { lattice.sub_state(s) > 0 };
                if chained {
                    relax(&lattice, prev, s - 1, s, &mut best);
                }
                // Free entry: sub-state 0 of a free block is reachable from
                // the final sub-state of any logical state (the last prefix
                // block's exit included).
                if s >= prefix_span && lattice.sub_state(s) == 0 {
                    let mut p = first_exit;
                    while p < n_expanded {
                        relax(&lattice, prev, p, s, &mut best);
                        p += self.min_frames;
                    }
                }
                // Residency beyond the minimum: only final sub-states loop.
                if lattice.sub_state(s) == exit {
                    relax(&lattice, prev, s, s, &mut best);
                }
                if best.parent.is_some() {
                    cur[s] = Cell {
                        parent: best.parent,
                        score: best.score + lattice.emission(s, f),
                    };
                }
            }
        }

        let last = &cells[(n_frames - 1) * n_expanded..];
        let endpoint = if force_align {
            first_exit
        } else {
            let mut best = first_exit;
            let mut p = first_exit;
            while p < n_expanded {
                if last[p].score > last[best].score {
                    best = p;
                }
                p += self.min_frames;
            }
            best
        };
        let score = last[endpoint].score;
        if score <= ZERO_LOG {
            return Err(DecodeError::NoValidPath);
        }

        let mut frame_labels = vec![0usize; n_frames];
        let mut s = endpoint;
        let mut f = n_frames - 1;
        frame_labels[f] = lattice.logical(s);
        while f > 0 {
            // A reachable cell past frame 0 always carries a parent; a
            // missing one means the table is corrupt, not merely empty.
            let Some(p) = cells[f * n_expanded + s].parent else {
                return Err(DecodeError::NoValidPath);
            };
            s = p;
            f -= 1;
            frame_labels[f] = lattice.logical(s);
        }

        let mut labels: Vec<usize> = Vec::new();
        for &label in &frame_labels {
            if labels.last() != Some(&label) {
                labels.push(label);
            }
        }
        debug!(score, runs = labels.len(), "decode complete");

        Ok(Decode { labels, frame_labels, score })
    }
}

/// Offer `from` at the previous frame as a predecessor of `to`, keeping it
/// if it beats the incumbent. Unreachable predecessors are never offered.
fn relax(lattice: &Lattice<'_>, prev: &[Cell], from: usize, to: usize, best: &mut Cell) {
    if prev[from].score <= ZERO_LOG {
        return;
    }
    let score = prev[from].score + lattice.transition_cost(from, to);
    if score > best.score {
        *best = Cell { parent: Some(from), score };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_six_frame() -> Posteriorgram {
        // Near-certain state 0 for frames 0-2, state 1 for frames 3-5.
        Posteriorgram::from_rows(vec![
            vec![-0.1, -0.1, -0.1, -5.0, -5.0, -5.0],
            vec![-5.0, -5.0, -5.0, -0.1, -0.1, -0.1],
        ])
        .unwrap()
    }

    #[test]
    fn rejects_zero_min_frames() {
        assert!(matches!(Decoder::new(0), Err(DecodeError::InvalidMinFrames)));
    }

    #[test]
    fn decodes_two_runs_of_three() {
        let pgram = two_state_six_frame();
        let transition = TransitionMatrix::uniform(2, 0.9).unwrap();
        let decoder = Decoder::new(2).unwrap();
        let decode = decoder.decode(&pgram, &transition).unwrap();
        assert_eq!(decode.labels, vec![0, 1]);
        assert_eq!(decode.frame_labels, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn runs_respect_minimum_residency() {
        // Posteriors flip preference every frame; the duration constraint
        // must still force runs of at least three.
        let pgram = Posteriorgram::from_rows(vec![
            vec![-0.1, -3.0, -0.1, -3.0, -0.1, -3.0],
            vec![-3.0, -0.1, -3.0, -0.1, -3.0, -0.1],
        ])
        .unwrap();
        let transition = TransitionMatrix::uniform(2, 0.9).unwrap();
        let decoder = Decoder::new(3).unwrap();
        let decode = decoder.decode(&pgram, &transition).unwrap();
        let mut run = 1;
        for w in decode.frame_labels.windows(2) {
            if w[0] == w[1] {
                run += 1;
            } else {
                assert!(run >= 3, "run of {run} shorter than residency");
                run = 1;
            }
        }
        assert!(run >= 3, "final run of {run} shorter than residency");
    }

    #[test]
    fn too_few_frames_is_no_valid_path() {
        let pgram = Posteriorgram::from_rows(vec![vec![-1.0, -1.0], vec![-1.0, -1.0]]).unwrap();
        let transition = TransitionMatrix::uniform(2, 0.9).unwrap();
        let decoder = Decoder::new(3).unwrap();
        assert!(matches!(
            decoder.decode(&pgram, &transition),
            Err(DecodeError::NoValidPath)
        ));
    }

    #[test]
    fn forced_alignment_pins_the_prefix() {
        let pgram = two_state_six_frame();
        let transition = TransitionMatrix::uniform(2, 0.9).unwrap();
        let decoder = Decoder::new(2).unwrap();
        // Pinning [1] keeps the whole path inside state 1 even though the
        // early frames strongly prefer state 0.
        let decode = decoder
            .decode_restricted(&pgram, &transition, &[1], true)
            .unwrap();
        assert_eq!(decode.labels, vec![1]);
        assert_eq!(decode.frame_labels, vec![1; 6]);
    }

    #[test]
    fn forced_score_matches_free_decode() {
        let pgram = two_state_six_frame();
        let transition = TransitionMatrix::uniform(2, 0.9).unwrap();
        let decoder = Decoder::new(2).unwrap();
        let free = decoder.decode(&pgram, &transition).unwrap();
        let forced = decoder
            .decode_restricted(&pgram, &transition, &free.labels, true)
            .unwrap();
        assert!((free.score - forced.score).abs() < 1e-9);
    }

    #[test]
    fn prefix_state_must_be_in_range() {
        let pgram = two_state_six_frame();
        let transition = TransitionMatrix::uniform(2, 0.9).unwrap();
        let decoder = Decoder::new(2).unwrap();
        assert!(matches!(
            decoder.decode_restricted(&pgram, &transition, &[2], false),
            Err(DecodeError::PrefixStateOutOfRange { state: 2, n_states: 2 })
        ));
    }

    #[test]
    fn state_counts_must_agree() {
        let pgram = two_state_six_frame();
        let transition = TransitionMatrix::uniform(3, 0.9).unwrap();
        let decoder = Decoder::new(2).unwrap();
        assert!(matches!(
            decoder.decode(&pgram, &transition),
            Err(DecodeError::StateCountMismatch { pgram: 2, transition: 3 })
        ));
    }

    #[test]
    fn unit_residency_matches_plain_viterbi() {
        // With min_frames = 1 the lattice degenerates to ordinary Viterbi:
        // strong per-frame preferences win outright.
        let pgram = Posteriorgram::from_rows(vec![
            vec![-0.1, -3.0, -3.0],
            vec![-3.0, -0.1, -3.0],
            vec![-3.0, -3.0, -0.1],
        ])
        .unwrap();
        let transition = TransitionMatrix::uniform(3, 0.5).unwrap();
        let decoder = Decoder::new(1).unwrap();
        let decode = decoder.decode(&pgram, &transition).unwrap();
        assert_eq!(decode.frame_labels, vec![0, 1, 2]);
        assert_eq!(decode.labels, vec![0, 1, 2]);
    }
}
