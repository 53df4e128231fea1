//! Error types for the proofstudy pipeline

use thiserror::Error;

/// Errors that can occur while loading or transforming participant data.
///
/// File-level problems are fatal for the participant being processed; per-row
/// anomalies (scoring-key misses, unknown event codes) are not represented
/// here because they degrade to sentinel values instead of aborting.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("expected column '{0}' missing from header")]
    SchemaMismatch(String),

    #[error("unparseable timestamp '{0}': expected integer epoch milliseconds")]
    TimestampParse(String),

    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("input is empty or has no header row")]
    EmptyInput,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
