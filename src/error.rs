// ============================================================
// Core Error Type
// ============================================================
// Every fallible operation of the library core returns GanError.
// The application and CLI layers wrap it in anyhow with context.
//
// Missing checkpoints are NOT errors: `load` returns Ok(None) so
// the serving layer can decide what to show instead.

use std::path::PathBuf;

/// Errors raised by the vocabulary, encoder, networks, trainer
/// and checkpoint code.
#[derive(thiserror::Error, Debug)]
pub enum GanError {
    /// Every sequence handed to `pad_batch` was longer than `max_length`
    /// (or no sequences were given at all).
    #[error("no sequence fits within max_length {max_length}; cannot build a batch")]
    EmptyBatch { max_length: usize },

    /// Sampling temperature must be finite and strictly positive.
    #[error("temperature must be a finite number > 0, got {0}")]
    InvalidTemperature(f64),

    /// Training options that can never produce a valid run.
    #[error("invalid training options: {0}")]
    InvalidOptions(String),

    /// The word segmenter rejected the input.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// The next-token distribution could not be sampled (NaN, all zero, ...).
    #[error("sampling failed: {0}")]
    Sampling(String),

    /// A loss became NaN or infinite. Training is aborted.
    #[error("training diverged at epoch {epoch}: {network} loss is {value}")]
    TrainingInstability {
        epoch: usize,
        network: &'static str,
        value: f64,
    },

    /// The checkpoint exists but cannot be turned back into a model.
    #[error("malformed checkpoint '{}': {reason}", path.display())]
    MalformedCheckpoint { path: PathBuf, reason: String },

    /// The checkpoint was written by an incompatible schema.
    #[error("checkpoint '{}' has format version {found}, expected {expected}", path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: usize,
        expected: usize,
    },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = GanError> = std::result::Result<T, E>;

impl GanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedCheckpoint {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
