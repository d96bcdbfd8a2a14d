//! Timeline error types.

use crate::probe::ProbeError;

/// Errors raised while probing, reconciling or assembling a timeline.
///
/// Every variant is fatal for the run. Values carry the beat index and the
/// computed numbers so an inconsistent script can be diagnosed.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Media for a beat could not be probed.
    #[error("Failed to probe media of beat {beat}: {source}")]
    ProbeFailed {
        beat: usize,
        #[source]
        source: ProbeError,
    },

    /// A voice-over beat's own audio is longer than what is left of the movie.
    #[error("Duration overflow at beat {beat}: audio {audio:.3}s exceeds remaining movie {remaining:.3}s")]
    DurationOverflow {
        beat: usize,
        audio: f64,
        remaining: f64,
    },

    /// The next beat's explicit start offset lies before this beat's start.
    #[error("Invalid startAt after beat {beat}: available duration {duration:.3}s < 0")]
    InvalidStartAt { beat: usize, duration: f64 },

    /// The next beat's explicit start offset cuts into this beat's audio.
    #[error("Duration overwrap at beat {beat}: duration {duration:.3}s is shorter than audio {audio:.3}s")]
    DurationOverwrap {
        beat: usize,
        duration: f64,
        audio: f64,
    },

    /// A beat declares values that can never produce a valid timeline.
    #[error("Invalid beat {beat}: {message}")]
    InvalidBeat { beat: usize, message: String },

    /// Script-level or configured padding is unusable.
    #[error("Invalid audio params: {message}")]
    InvalidAudioParams { message: String },

    /// A beat has probed audio but no audio file to concatenate.
    #[error("Beat {beat} has audio duration but no audio file")]
    MissingAudioFile { beat: usize },

    /// Nothing to concatenate.
    #[error("Timeline is empty: no audio or silence to concatenate")]
    EmptyTimeline,

    /// The probing worker pool could not be created.
    #[error("Failed to start probe workers: {0}")]
    WorkerPool(String),
}

impl TimelineError {
    /// Create an invalid beat error.
    pub fn invalid_beat(beat: usize, message: impl Into<String>) -> Self {
        Self::InvalidBeat {
            beat,
            message: message.into(),
        }
    }

    /// Index of the offending beat, when the error is tied to one.
    pub fn beat(&self) -> Option<usize> {
        match self {
            TimelineError::ProbeFailed { beat, .. }
            | TimelineError::DurationOverflow { beat, .. }
            | TimelineError::InvalidStartAt { beat, .. }
            | TimelineError::DurationOverwrap { beat, .. }
            | TimelineError::InvalidBeat { beat, .. }
            | TimelineError::MissingAudioFile { beat } => Some(*beat),
            TimelineError::InvalidAudioParams { .. }
            | TimelineError::EmptyTimeline
            | TimelineError::WorkerPool(_) => None,
        }
    }
}

/// Result type for timeline operations.
pub type TimelineResult<T> = Result<T, TimelineError>;
