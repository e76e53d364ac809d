use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration, record-shape, IO, and persistence failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A record lacks a field every record must carry.
    #[error("record {index} in '{}' is missing required key '{key}'", path.display())]
    MissingKey {
        /// Required field name.
        key: String,
        /// Position of the record in its input.
        index: usize,
        /// Input file, or `<memory>` for in-process lists.
        path: PathBuf,
    },
    /// A collected result file that cannot be folded into a snapshot.
    #[error("result file '{}' is malformed: {reason}", path.display())]
    MalformedResultFile {
        /// Offending file.
        path: PathBuf,
        /// Parse or shape failure.
        reason: String,
    },
    /// Invalid source, folder layout, or partition settings.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// JSON that does not parse into the expected type.
    #[error("failed to parse '{}': {source}", path.display())]
    Json {
        /// File being read or written.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
    /// Store bookkeeping failed (poisoned lock, unserializable record).
    #[error("artifact store failure: {0}")]
    Persistence(String),
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Directory listing failure.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

impl PipelineError {
    /// True when the error only disqualifies a single result file.
    pub fn is_skippable_result(&self) -> bool {
        matches!(self, PipelineError::MalformedResultFile { .. })
    }
}
