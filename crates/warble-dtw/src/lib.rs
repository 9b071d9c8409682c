//! Segmental dynamic time warping over acoustic frame sequences.
//!
//! Pure math library — zero I/O. Builds frame-pair similarity matrices,
//! finds banded corner-to-corner or segmental DTW paths through them, and
//! refines raw paths to their best-scoring core (Park & Glass 2008).

mod band;
mod error;
mod frames;
mod path;
mod pathfinder;
mod refine;
mod similarity;

pub use band::DiagonalBand;
pub use error::AlignError;
pub use frames::FrameSequence;
pub use path::{AlignmentPath, PathPoint, best_score_per_frame, raise_silence_cost};
pub use pathfinder::PathFinder;
pub use refine::RefineConfig;
pub use similarity::SimilarityMatrix;
