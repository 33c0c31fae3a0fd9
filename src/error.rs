//! Error taxonomy for a report run.
//!
//! Cell-level parse problems never show up here: they are recovered during
//! cleaning and reported as [`crate::analyzers::clean::ParseFailure`] records.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    #[error("required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("malformed input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to write '{target}': {reason}")]
    SinkWriteFailure { target: String, reason: String },
}

impl PipelineError {
    pub fn source_unavailable(source_id: impl ToString, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn sink(target: impl ToString, reason: impl ToString) -> Self {
        Self::SinkWriteFailure {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the run can have produced no output at all because of this error.
    pub fn aborts_run(&self) -> bool {
        !matches!(self, Self::SinkWriteFailure { .. })
    }
}
