//! Duration-constrained Viterbi decoding over posteriorgrams.
//!
//! Decodes a best label sequence through a states × frames grid of
//! log-domain scores, enforcing a minimum per-label residency via an
//! expanded sub-state lattice. Supports pinned-prefix (forced) decoding
//! and an approximate consensus aligner over sets of posteriorgrams.

mod consensus;
mod error;
mod lattice;
mod posterior;
mod transition;
mod viterbi;

pub use consensus::{Consensus, ConsensusConfig};
pub use error::DecodeError;
pub use posterior::Posteriorgram;
pub use transition::TransitionMatrix;
pub use viterbi::{Decode, Decoder};
