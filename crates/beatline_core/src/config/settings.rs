//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::AudioParams;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Presentation-style audio defaults.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Duration probing.
    #[serde(default)]
    pub probe: ProbeSettings,

    /// Final concatenation.
    #[serde(default)]
    pub concat: ConcatSettings,
}

impl Settings {
    /// Check values that deserialize fine but can never produce a timeline.
    pub fn validate(&self) -> Result<(), String> {
        self.audio.params().validate().map_err(|e| e.to_string())?;
        if self.audio.sample_rate == 0 {
            return Err("audio.sample_rate must be positive".to_string());
        }
        if self.audio.channel_layout.trim().is_empty() {
            return Err("audio.channel_layout must not be empty".to_string());
        }
        Ok(())
    }
}

/// Path configuration for output and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for rendered audio tracks.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for per-run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for console and run logs.
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format (tool output only kept in the tail buffer).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show on error.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Log the ffmpeg command one argument per line.
    #[serde(default)]
    pub show_command_pretty: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: default_error_tail(),
            show_command_pretty: false,
        }
    }
}

/// Presentation-style audio defaults and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Padding after each beat's audio, in seconds.
    #[serde(default = "default_padding")]
    pub padding: f64,

    /// Padding after the second-to-last beat, in seconds.
    #[serde(default = "default_closing_padding")]
    pub closing_padding: f64,

    /// Sample rate every input is normalized to.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Channel layout every input is normalized to.
    #[serde(default = "default_channel_layout")]
    pub channel_layout: String,
}

fn default_padding() -> f64 {
    AudioParams::default().padding
}

fn default_closing_padding() -> f64 {
    AudioParams::default().closing_padding
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_channel_layout() -> String {
    "stereo".to_string()
}

impl AudioSettings {
    /// Presentation-style padding defaults.
    pub fn params(&self) -> AudioParams {
        AudioParams {
            padding: self.padding,
            closing_padding: self.closing_padding,
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            closing_padding: default_closing_padding(),
            sample_rate: default_sample_rate(),
            channel_layout: default_channel_layout(),
        }
    }
}

/// Duration probing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Probe workers (0 = twice the available cores).
    #[serde(default)]
    pub workers: usize,
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            ffprobe_path: default_ffprobe_path(),
            workers: 0,
        }
    }
}

/// Concatenation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatSettings {
    /// ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Silent audio file looped as the silence source.
    /// Empty uses ffmpeg's `anullsrc` generator.
    #[serde(default)]
    pub silence_source: String,

    /// Kill ffmpeg after this many seconds (0 = no limit).
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

impl Default for ConcatSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            silence_source: String::new(),
            timeout_secs: 0,
        }
    }
}

/// Config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Audio,
    Probe,
    Concat,
}

impl ConfigSection {
    /// Every section, in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Audio,
        ConfigSection::Probe,
        ConfigSection::Concat,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Audio => "audio",
            ConfigSection::Probe => "probe",
            ConfigSection::Concat => "concat",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and log directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Audio => "Beat padding and output format",
            ConfigSection::Probe => "Media duration probing",
            ConfigSection::Concat => "Final audio concatenation",
        }
    }
}
