//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very verbose tracing.
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive understood by `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Map a `-v` count onto a level, starting from `base`.
    pub fn raised_by(self, verbosity: u8) -> LogLevel {
        match (self, verbosity) {
            (level, 0) => level,
            (LogLevel::Trace | LogLevel::Debug, _) | (_, 2..) => LogLevel::Trace,
            (_, _) => LogLevel::Debug,
        }
    }
}

/// Configuration for a run logger.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level written to the run log.
    pub level: LogLevel,
    /// Keep tool output in the tail buffer only.
    pub compact: bool,
    /// Tool output lines kept for error diagnosis.
    pub error_tail: usize,
    /// Prefix lines with a wall-clock timestamp.
    pub show_timestamps: bool,
    /// Log the ffmpeg command one argument per line.
    pub pretty_command: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: 20,
            show_timestamps: true,
            pretty_command: false,
        }
    }
}

impl LogConfig {
    /// Build from the `[logging]` config section.
    pub fn from_settings(settings: &crate::config::LoggingSettings) -> Self {
        Self {
            level: settings.level,
            compact: settings.compact,
            error_tail: settings.error_tail as usize,
            show_timestamps: true,
            pretty_command: settings.show_command_pretty,
        }
    }
}

/// Receives every formatted run log line.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Message prefix types for consistent formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// `$ command`
    Command,
    /// `=== Phase ===`
    Phase,
    /// `[SUCCESS]`
    Success,
    /// `[WARNING]`
    Warning,
    /// `[ERROR]`
    Error,
    None,
}

impl MessagePrefix {
    /// Format a message with this prefix.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
            MessagePrefix::None => message.to_string(),
        }
    }
}
