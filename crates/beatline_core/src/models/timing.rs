//! Derived timing structures (probes and the reconciled timing table).

use serde::{Deserialize, Serialize};

/// Probed durations of a single beat's media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaProbe {
    /// Movie duration in seconds, already divided by playback speed (0 if none).
    pub movie_duration: f64,
    /// Duration of the beat's own audio file (0 if none).
    pub audio_duration: f64,
    /// Whether the movie carries an audio stream.
    pub has_movie_audio: bool,
}

impl MediaProbe {
    /// Probe for a beat with only its own audio.
    pub fn audio(seconds: f64) -> Self {
        Self {
            audio_duration: seconds,
            ..Default::default()
        }
    }

    /// Probe for a beat with only a movie.
    pub fn movie(seconds: f64, has_audio: bool) -> Self {
        Self {
            movie_duration: seconds,
            has_movie_audio: has_audio,
            ..Default::default()
        }
    }

    /// Probe for a beat with no media at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the beat has any independent media.
    pub fn has_media(&self) -> bool {
        self.movie_duration + self.audio_duration > 0.0
    }
}

/// Final timing of one beat, consumed by video assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledBeat {
    /// Final beat length in seconds.
    pub duration: f64,
    /// Duration of the beat's own audio.
    pub audio_duration: f64,
    /// Duration of the beat's movie.
    pub movie_duration: f64,
    /// Generated silence appended for this beat.
    pub silence_duration: f64,
    /// Whether the movie carries its own audio stream.
    pub has_movie_audio: bool,
    /// Offset of this beat from the start of the track.
    pub start_at: f64,
}

impl ReconciledBeat {
    /// End of this beat on the track.
    pub fn end_at(&self) -> f64 {
        self.start_at + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_media_checks_both_durations() {
        assert!(!MediaProbe::empty().has_media());
        assert!(MediaProbe::audio(1.0).has_media());
        assert!(MediaProbe::movie(2.0, false).has_media());
    }

    #[test]
    fn timing_table_serializes_camel_case() {
        let beat = ReconciledBeat {
            duration: 2.5,
            silence_duration: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&beat).unwrap();
        assert!(json.contains("\"silenceDuration\":0.5"));
        assert!(json.contains("\"startAt\":0.0"));
        assert!(json.contains("\"hasMovieAudio\":false"));
    }
}
