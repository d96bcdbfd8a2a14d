//! Concatenation error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from the final ffmpeg concatenation.
#[derive(Error, Debug)]
pub enum ConcatError {
    /// ffmpeg ran and exited non-zero; `message` is its stderr.
    #[error("ffmpeg failed with exit code {exit_code}: {message}")]
    ConcatenationFailed { exit_code: i32, message: String },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("ffmpeg produced no output at {0}")]
    OutputMissing(PathBuf),

    #[error("Concatenation cancelled")]
    Cancelled,

    #[error("ffmpeg timed out after {0}s")]
    TimedOut(u64),

    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl ConcatError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        ConcatError::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for concatenation.
pub type ConcatResult<T> = Result<T, ConcatError>;
