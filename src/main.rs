use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use warble_dtw::{FrameSequence, PathFinder, RefineConfig, SimilarityMatrix, raise_silence_cost};
use warble_viterbi::{ConsensusConfig, Decoder, Posteriorgram, TransitionMatrix};

#[derive(Parser)]
#[command(name = "warble")]
#[command(about = "Segmental DTW alignment and duration-constrained Viterbi decoding")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Align two frame matrices with cosine-distance DTW
    Warp {
        /// Path to the first frame matrix (JSON, frames x features)
        #[arg(long)]
        a: PathBuf,

        /// Path to the second frame matrix (JSON, frames x features)
        #[arg(long)]
        b: PathBuf,

        /// Band radius for segmental DTW; omit for one corner-to-corner path
        #[arg(long)]
        radius: Option<usize>,

        /// Refine each path to its lowest-cost core of at least this length
        #[arg(long)]
        min_length: Option<usize>,

        /// Budgeted window extension factor (negative disables extension)
        #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
        expansion_factor: f64,

        /// Path to a per-frame silence mask for the first matrix (JSON bools)
        #[arg(long)]
        silence: Option<PathBuf>,

        /// Include full point lists in the output, not just path summaries
        #[arg(long)]
        points: bool,
    },

    /// Decode a best label sequence from a posteriorgram
    Decode {
        /// Path to the posteriorgram (JSON, states x frames, log domain)
        #[arg(long)]
        pgram: PathBuf,

        /// Minimum frames each label must persist
        #[arg(long)]
        min_frames: usize,

        /// Path to a transition matrix (JSON, states x states, log domain)
        #[arg(long)]
        transition: Option<PathBuf>,

        /// Self-loop probability for a uniform transition matrix
        #[arg(long, default_value_t = 0.9)]
        self_loop: f64,

        /// Comma-separated label prefix to pin at the start of the path
        #[arg(long, value_delimiter = ',')]
        prefix: Vec<usize>,

        /// Pin the endpoint to the prefix, scoring the prefix itself
        #[arg(long)]
        force_align: bool,
    },

    /// Find the consensus label sequence over a set of posteriorgrams
    Consensus {
        /// Paths to the posteriorgrams (JSON, states x frames, log domain)
        #[arg(long = "pgram", required = true)]
        pgrams: Vec<PathBuf>,

        /// Minimum frames each label must persist
        #[arg(long)]
        min_frames: usize,

        /// Path to a transition matrix (JSON, states x states, log domain)
        #[arg(long)]
        transition: Option<PathBuf>,

        /// Self-loop probability for a uniform transition matrix
        #[arg(long, default_value_t = 0.9)]
        self_loop: f64,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct WarpOutput {
    rows: usize,
    cols: usize,
    n_paths: usize,
    paths: Vec<PathOutput>,
}

#[derive(Serialize)]
struct PathOutput {
    start: (usize, usize),
    end: (usize, usize),
    len: usize,
    total_score: f64,
    mean_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<Vec<(usize, usize, f64)>>,
}

#[derive(Serialize)]
struct DecodeOutput {
    states: usize,
    frames: usize,
    min_frames: usize,
    labels: Vec<usize>,
    frame_labels: Vec<usize>,
    score: f64,
}

#[derive(Serialize)]
struct ConsensusOutput {
    set_size: usize,
    states: usize,
    min_frames: usize,
    labels: Vec<usize>,
    score: f64,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid JSON {what}", path.display()))
}

fn read_frames(path: &Path) -> Result<FrameSequence> {
    let rows: Vec<Vec<f64>> = read_json(path, "frame matrix")?;
    FrameSequence::from_rows(rows)
        .with_context(|| format!("invalid frame matrix in {}", path.display()))
}

fn read_pgram(path: &Path) -> Result<Posteriorgram> {
    let rows: Vec<Vec<f64>> = read_json(path, "posteriorgram")?;
    Posteriorgram::from_rows(rows)
        .with_context(|| format!("invalid posteriorgram in {}", path.display()))
}

fn build_transition(
    transition: Option<&Path>,
    self_loop: f64,
    n_states: usize,
) -> Result<TransitionMatrix> {
    match transition {
        Some(path) => {
            let rows: Vec<Vec<f64>> = read_json(path, "transition matrix")?;
            TransitionMatrix::from_rows(rows)
                .with_context(|| format!("invalid transition matrix in {}", path.display()))
        }
        None => TransitionMatrix::uniform(n_states, self_loop)
            .context("invalid self-loop probability"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Warp {
            a,
            b,
            radius,
            min_length,
            expansion_factor,
            silence,
            points,
        } => {
            let seq_a = read_frames(&a)?;
            let seq_b = read_frames(&b)?;
            info!(
                rows = seq_a.n_frames(),
                cols = seq_b.n_frames(),
                dims = seq_a.n_dims(),
                "frame matrices loaded"
            );

            let sim = SimilarityMatrix::cosine(&seq_a, &seq_b)
                .context("failed to build similarity matrix")?;
            let finder = PathFinder::new(&sim)?;

            let mut paths = match radius {
                Some(radius) => finder.segmental(radius)?,
                None => vec![finder.standard()?],
            };
            info!(n_paths = paths.len(), "alignment paths found");

            if let Some(silence) = silence {
                let mask: Vec<bool> = read_json(&silence, "silence mask")?;
                raise_silence_cost(&mut paths, &mask)
                    .context("failed to apply silence mask")?;
                info!("silence cost raised");
            }

            if let Some(min_length) = min_length {
                let config = RefineConfig::new(min_length)?
                    .with_expansion_factor(expansion_factor);
                paths = config.refine_all(paths);
                info!(n_paths = paths.len(), "paths refined");
            }

            let output = WarpOutput {
                rows: sim.rows(),
                cols: sim.cols(),
                n_paths: paths.len(),
                paths: paths
                    .iter()
                    .map(|p| PathOutput {
                        start: (p.start().first, p.start().second),
                        end: (p.end().first, p.end().second),
                        len: p.len(),
                        total_score: p.total_score(),
                        mean_score: p.total_score() / p.len().max(1) as f64,
                        points: points.then(|| {
                            p.points()
                                .iter()
                                .map(|pt| (pt.first, pt.second, pt.score))
                                .collect()
                        }),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Decode {
            pgram,
            min_frames,
            transition,
            self_loop,
            prefix,
            force_align,
        } => {
            let pgram = read_pgram(&pgram)?;
            info!(
                states = pgram.n_states(),
                frames = pgram.n_frames(),
                "posteriorgram loaded"
            );

            let transition = build_transition(transition.as_deref(), self_loop, pgram.n_states())?;
            let decoder = Decoder::new(min_frames)?;
            let decode = decoder
                .decode_restricted(&pgram, &transition, &prefix, force_align)
                .context("decoding failed")?;
            info!(score = decode.score, runs = decode.labels.len(), "decode complete");

            let output = DecodeOutput {
                states: pgram.n_states(),
                frames: pgram.n_frames(),
                min_frames,
                labels: decode.labels,
                frame_labels: decode.frame_labels,
                score: decode.score,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Consensus {
            pgrams,
            min_frames,
            transition,
            self_loop,
        } => {
            let set: Vec<Posteriorgram> = pgrams
                .iter()
                .map(|path| read_pgram(path))
                .collect::<Result<_>>()?;
            let n_states = set.first().map_or(0, Posteriorgram::n_states);
            info!(set_size = set.len(), states = n_states, "posteriorgram set loaded");

            let transition = build_transition(transition.as_deref(), self_loop, n_states)?;
            let config = ConsensusConfig::new(min_frames)?;
            let consensus = config
                .align(&set, &transition)
                .context("consensus alignment failed")?;
            info!(score = consensus.score, runs = consensus.labels.len(), "consensus complete");

            let output = ConsensusOutput {
                set_size: set.len(),
                states: n_states,
                min_frames,
                labels: consensus.labels,
                score: consensus.score,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
