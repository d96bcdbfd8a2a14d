//! Types for duration probing.

use std::path::PathBuf;

use crate::models::MediaSource;

/// Error type for a single probe query.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Local media file does not exist.
    #[error("Media file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The probe tool could not be started.
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The probe tool exited with an error.
    #[error("{tool} failed with exit code {exit_code} on '{input}': {message}")]
    ToolFailed {
        tool: String,
        input: String,
        exit_code: i32,
        message: String,
    },

    /// The tool's output could not be interpreted.
    #[error("Failed to parse probe output for '{input}': {message}")]
    Parse { input: String, message: String },
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// What the media tool reports about one file or URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration: f64,
    /// Whether at least one audio stream is present.
    pub has_audio: bool,
}

/// Source of media durations.
///
/// The production implementation shells out to ffprobe; tests plug in
/// fixed tables.
pub trait DurationProbe: Send + Sync {
    /// Report duration and audio presence of a media source.
    fn probe(&self, source: &MediaSource) -> ProbeResult<MediaInfo>;
}
