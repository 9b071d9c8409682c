//! Approximate consensus label sequence over a set of posteriorgrams.
//!
//! Grows candidate label sequences one segment at a time, scoring each
//! candidate as the average forced-alignment score across the whole set.
//! This is an approximation: each cell commits to its locally best
//! predecessor and never reconsiders it, so the result is not guaranteed
//! to be the jointly optimal sequence.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::error::DecodeError;
use crate::lattice::{Cell, ZERO_LOG};
use crate::posterior::Posteriorgram;
use crate::transition::TransitionMatrix;
use crate::viterbi::Decoder;

/// Consensus result: the winning label sequence and its average
/// forced-alignment score across the set.
#[derive(Debug, Clone, PartialEq)]
pub struct Consensus {
    /// Logical-state indices, consecutive entries always distinct.
    pub labels: Vec<usize>,
    /// Average forced-alignment log score over the set.
    pub score: f64,
}

/// Configuration for consensus alignment over a posteriorgram set.
#[derive(Debug, Clone, Copy)]
pub struct ConsensusConfig {
    min_frames: usize,
}

impl ConsensusConfig {
    /// Create a consensus configuration with the given minimum residency.
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

    /// Find the label sequence that best explains every posteriorgram in
    /// the set at once.
    ///
    /// The segment budget is `max(2, shortest_frame_count / min_frames)`;
    /// sequences of every length up to the budget compete and the best
    /// average score wins. A set member whose forced decode of a candidate
    /// has no valid path contributes the unreachable sentinel instead of
    /// aborting the search.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecodeError::EmptySet`] | `pgrams` is empty |
    /// | [`DecodeError::StateCountMismatch`] | A set member disagrees with the transition matrix on the state count |
    /// | [`DecodeError::NoValidPath`] | No candidate sequence is valid for any set member |
    #[instrument(skip_all, fields(set = pgrams.len(), min_frames = self.min_frames))]
    pub fn align(
        &self,
        pgrams: &[Posteriorgram],
        transition: &TransitionMatrix,
    ) -> Result<Consensus, DecodeError> {
        if pgrams.is_empty() {
            return Err(DecodeError::EmptySet);
        }
        let n_states = transition.n_states();
        for pgram in pgrams {
            if pgram.n_states() != n_states {
                return Err(DecodeError::StateCountMismatch {
                    pgram: pgram.n_states(),
                    transition: n_states,
                });
            }
        }

        let decoder = Decoder::new(self.min_frames)?;
        let shortest = pgrams
            .iter()
            .map(Posteriorgram::n_frames)
            .min()
            .unwrap_or(0);
        let segments = (shortest / self.min_frames).max(2);
        debug!(segments, shortest, "consensus segment budget");

        let mut dp = vec![Cell::UNREACHABLE; segments * n_states];
        for s in 0..n_states {
            let score = average_forced_score(&decoder, pgrams, transition, &[s])?;
            dp[s] = Cell { parent: None, score };
        }
        for seg in 1..segments {
            for s in 0..n_states {
                let mut best = Cell::UNREACHABLE;
                for p in 0..n_states {
                    // Consecutive labels are distinct; repetition is
                    // residency, not a new segment.
                    if p == s || dp[(seg - 1) * n_states + p].score <= ZERO_LOG {
                        continue;
                    }
                    let mut candidate = sub_path(&dp, n_states, seg - 1, p);
                    candidate.push(s);
                    let score =
                        average_forced_score(&decoder, pgrams, transition, &candidate)?;
                    if score > best.score {
                        best = Cell { parent: Some(p), score };
                    }
                }
                dp[seg * n_states + s] = best;
            }
            debug!(seg, "consensus segment scored");
        }

        let mut best_seg = 0;
        let mut best_state = 0;
        for seg in 0..segments {
            for s in 0..n_states {
                if dp[seg * n_states + s].score > dp[best_seg * n_states + best_state].score {
                    best_seg = seg;
                    best_state = s;
                }
            }
        }
        let best = dp[best_seg * n_states + best_state];
        if best.score <= ZERO_LOG {
            return Err(DecodeError::NoValidPath);
        }

        Ok(Consensus {
            labels: sub_path(&dp, n_states, best_seg, best_state),
            score: best.score,
        })
    }
}

/// Average forced-alignment score of `labels` over the set. A member with
/// no valid path contributes the unreachable sentinel.
fn average_forced_score(
    decoder: &Decoder,
    pgrams: &[Posteriorgram],
    transition: &TransitionMatrix,
    labels: &[usize],
) -> Result<f64, DecodeError> {
    let total: f64 = pgrams
        .par_iter()
        .map(|pgram| {
            match decoder.decode_restricted(pgram, transition, labels, true) {
                Ok(decode) => Ok(decode.score),
                Err(DecodeError::NoValidPath) => Ok(ZERO_LOG),
                Err(err) => Err(err),
            }
        })
        .sum::<Result<f64, DecodeError>>()?;
    Ok(total / pgrams.len() as f64)
}

/// Reconstruct the committed label sequence ending at (`seg`, `state`) by
/// walking the backpointers toward segment 0.
fn sub_path(dp: &[Cell], n_states: usize, mut seg: usize, mut state: usize) -> Vec<usize> {
    let mut out = vec![state];
    while seg > 0 {
        let Some(p) = dp[seg * n_states + state].parent else {
            break;
        };
        state = p;
        seg -= 1;
        out.push(state);
    }
    out.reverse();
    out
}
