//! Script input structures (beats, media references, audio params).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::timeline::{TimelineError, TimelineResult};

/// Reference to a media file, either on disk or remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    /// Local file path.
    Path { path: PathBuf },
    /// Remote URL, passed through to the media tool untouched.
    Url { url: String },
}

impl MediaSource {
    /// Create a local path source.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path { path: path.into() }
    }

    /// Create a URL source.
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    /// The argument handed to ffprobe/ffmpeg for this source.
    pub fn as_tool_arg(&self) -> String {
        match self {
            MediaSource::Path { path } => path.to_string_lossy().to_string(),
            MediaSource::Url { url } => url.clone(),
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Path { path } => write!(f, "{}", path.display()),
            MediaSource::Url { url } => write!(f, "{}", url),
        }
    }
}

/// Visual attached to a beat. Only movies and voice-overs carry timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BeatImage {
    /// A movie clip played under the beat.
    Movie { source: MediaSource },
    /// Narration riding the preceding movie's timeline.
    VoiceOver {
        /// Offset into the movie where this beat's narration starts.
        #[serde(default, rename = "startAt", skip_serializing_if = "Option::is_none")]
        start_at: Option<f64>,
    },
    /// Any static visual (image, chart, markdown slide...).
    #[serde(other)]
    Static,
}

/// Per-beat audio overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeatAudioParams {
    /// Padding after this beat's audio, overriding the presentation style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
}

/// Per-beat movie playback settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieParams {
    /// Playback speed multiplier (default 1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// One narrated segment of the script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    /// Declared fixed duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Attached visual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<BeatImage>,
    /// The beat's own narration clip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<MediaSource>,
    /// Per-beat audio overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_params: Option<BeatAudioParams>,
    /// Movie playback settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_params: Option<MovieParams>,
}

impl Beat {
    /// Create an empty beat (no media, no fixed duration).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the beat's own narration clip.
    pub fn with_audio(mut self, source: MediaSource) -> Self {
        self.audio_file = Some(source);
        self
    }

    /// Attach a movie clip.
    pub fn with_movie(mut self, source: MediaSource) -> Self {
        self.image = Some(BeatImage::Movie { source });
        self
    }

    /// Mark this beat as a voice-over on the preceding movie.
    pub fn with_voice_over(mut self, start_at: Option<f64>) -> Self {
        self.image = Some(BeatImage::VoiceOver { start_at });
        self
    }

    /// Declare a fixed duration.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Override the padding after this beat.
    pub fn with_padding(mut self, seconds: f64) -> Self {
        self.audio_params = Some(BeatAudioParams {
            padding: Some(seconds),
        });
        self
    }

    /// Set the movie playback speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.movie_params = Some(MovieParams { speed: Some(speed) });
        self
    }

    /// The movie source, if the beat shows a movie.
    pub fn movie_source(&self) -> Option<&MediaSource> {
        match self.image {
            Some(BeatImage::Movie { ref source }) => Some(source),
            _ => None,
        }
    }

    /// Per-beat padding override.
    pub fn padding_override(&self) -> Option<f64> {
        self.audio_params.as_ref().and_then(|p| p.padding)
    }

    /// Movie playback speed (1.0 when unset).
    pub fn movie_speed(&self) -> f64 {
        self.movie_params
            .as_ref()
            .and_then(|p| p.speed)
            .unwrap_or(1.0)
    }

    /// Check declared numbers before any probing happens.
    fn validate(&self, index: usize) -> TimelineResult<()> {
        let non_negative = [
            ("duration", self.duration),
            ("padding", self.padding_override()),
            (
                "startAt",
                match self.image {
                    Some(BeatImage::VoiceOver { start_at }) => start_at,
                    _ => None,
                },
            ),
        ];
        for (name, value) in non_negative {
            check_non_negative(name, value)
                .map_err(|message| TimelineError::invalid_beat(index, message))?;
        }

        if let Some(speed) = self.movie_params.as_ref().and_then(|p| p.speed) {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(TimelineError::invalid_beat(
                    index,
                    format!("movie speed must be positive, got {}", speed),
                ));
            }
        }

        Ok(())
    }
}

/// Presentation-style audio defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioParams {
    /// Standard padding after each beat's audio.
    pub padding: f64,
    /// Padding after the second-to-last beat.
    pub closing_padding: f64,
}

impl AudioParams {
    /// Both paddings must be finite and non-negative.
    pub fn validate(&self) -> TimelineResult<()> {
        check_non_negative("padding", Some(self.padding))
            .and_then(|_| check_non_negative("closingPadding", Some(self.closing_padding)))
            .map_err(|message| TimelineError::InvalidAudioParams { message })
    }
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            padding: 0.3,
            closing_padding: 0.8,
        }
    }
}

/// Script-level overrides of the presentation-style defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptAudioParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_padding: Option<f64>,
}

/// Ordered beat list supplied by the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub beats: Vec<Beat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_params: Option<ScriptAudioParams>,
}

impl Script {
    /// Create a script from beats.
    pub fn new(beats: Vec<Beat>) -> Self {
        Self {
            beats,
            audio_params: None,
        }
    }

    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Resolve the effective audio params against configured defaults.
    pub fn audio_params(&self, defaults: AudioParams) -> AudioParams {
        let overrides = self.audio_params.clone().unwrap_or_default();
        AudioParams {
            padding: overrides.padding.unwrap_or(defaults.padding),
            closing_padding: overrides.closing_padding.unwrap_or(defaults.closing_padding),
        }
    }

    /// Validate every beat's declared values and the script-level overrides.
    pub fn validate(&self) -> TimelineResult<()> {
        if let Some(ref overrides) = self.audio_params {
            check_non_negative("padding", overrides.padding)
                .and_then(|_| check_non_negative("closingPadding", overrides.closing_padding))
                .map_err(|message| TimelineError::InvalidAudioParams { message })?;
        }
        for (index, beat) in self.beats.iter().enumerate() {
            beat.validate(index)?;
        }
        Ok(())
    }
}

/// `Err` with a message when a declared value is negative or not finite.
fn check_non_negative(name: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(format!(
            "{} must be a non-negative number, got {}",
            name, v
        )),
        _ => Ok(()),
    }
}
