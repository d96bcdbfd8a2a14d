//! Beat classification.

use crate::models::{Beat, BeatImage};

/// What kind of media a beat declares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeatKind {
    /// Only its own narration clip.
    OwnAudio,
    /// A movie clip (possibly with narration on top).
    OwnMovie,
    /// Rides the preceding movie's timeline.
    VoiceOver {
        /// Explicit offset into the movie, if anchored.
        start_at: Option<f64>,
    },
    /// No media of its own.
    Empty,
}

impl BeatKind {
    /// Whether this beat rides a preceding movie.
    pub fn is_voice_over(&self) -> bool {
        matches!(self, BeatKind::VoiceOver { .. })
    }

    /// Explicit movie offset of a voice-over beat.
    ///
    /// An offset of zero counts as not anchored.
    pub fn explicit_start(&self) -> Option<f64> {
        match *self {
            BeatKind::VoiceOver {
                start_at: Some(start),
            } if start > 0.0 => Some(start),
            _ => None,
        }
    }
}

/// Classify a beat from its declaration. Pure, no I/O.
pub fn classify(beat: &Beat) -> BeatKind {
    match beat.image {
        Some(BeatImage::VoiceOver { start_at }) => BeatKind::VoiceOver { start_at },
        Some(BeatImage::Movie { .. }) => BeatKind::OwnMovie,
        _ if beat.audio_file.is_some() => BeatKind::OwnAudio,
        _ => BeatKind::Empty,
    }
}
