//! Duration probing using `ffprobe -of json`.

use std::process::Command;

use serde_json::Value;

use super::types::{DurationProbe, MediaInfo, ProbeError, ProbeResult};
use crate::models::MediaSource;

/// ffprobe-backed [`DurationProbe`].
#[derive(Debug, Clone)]
pub struct Ffprobe {
    program: String,
}

impl Ffprobe {
    /// Use `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }

    /// Use a specific ffprobe binary.
    pub fn with_path(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The binary this prober runs.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationProbe for Ffprobe {
    fn probe(&self, source: &MediaSource) -> ProbeResult<MediaInfo> {
        if let MediaSource::Path { path } = source {
            if !path.exists() {
                return Err(ProbeError::FileNotFound(path.clone()));
            }
        }

        let input = source.as_tool_arg();
        tracing::debug!("Probing media: {}", input);

        let output = Command::new(&self.program)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration:stream=codec_type")
            .arg("-of")
            .arg("json")
            .arg(&input)
            .output()
            .map_err(|e| ProbeError::Spawn {
                tool: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                tool: self.program.clone(),
                input,
                exit_code: output.status.code().unwrap_or(-1),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let json: Value = serde_json::from_slice(&output.stdout).map_err(|e| ProbeError::Parse {
            input: input.clone(),
            message: e.to_string(),
        })?;

        parse_probe_json(&json, &input)
    }
}

/// Parse the JSON printed by ffprobe.
///
/// ffprobe reports `format.duration` as a string; a missing or unparsable
/// duration is an error rather than zero.
fn parse_probe_json(json: &Value, input: &str) -> ProbeResult<MediaInfo> {
    let duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| match d {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ProbeError::Parse {
            input: input.to_string(),
            message: "missing or invalid format.duration".to_string(),
        })?;

    let has_audio = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(|streams| {
            streams
                .iter()
                .any(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("audio"))
        })
        .unwrap_or(false);

    Ok(MediaInfo {
        duration,
        has_audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_duration_and_audio_stream() {
        let json: Value = serde_json::from_str(
            r#"{
                "programs": [],
                "streams": [{ "codec_type": "video" }, { "codec_type": "audio" }],
                "format": { "duration": "12.480000" }
            }"#,
        )
        .unwrap();

        let info = parse_probe_json(&json, "movie.mp4").unwrap();
        assert!((info.duration - 12.48).abs() < 1e-9);
        assert!(info.has_audio);
    }

    #[test]
    fn video_only_has_no_audio() {
        let json: Value = serde_json::from_str(
            r#"{ "streams": [{ "codec_type": "video" }], "format": { "duration": "3.0" } }"#,
        )
        .unwrap();

        let info = parse_probe_json(&json, "silent.mp4").unwrap();
        assert!(!info.has_audio);
    }

    #[test]
    fn missing_duration_is_an_error() {
        let json: Value = serde_json::from_str(r#"{ "streams": [], "format": {} }"#).unwrap();
        let result = parse_probe_json(&json, "broken.mp3");
        assert!(matches!(result, Err(ProbeError::Parse { .. })));
    }

    #[test]
    fn probe_rejects_missing_file() {
        let prober = Ffprobe::new();
        let result = prober.probe(&MediaSource::Path {
            path: PathBuf::from("/nonexistent/narration.mp3"),
        });
        assert!(matches!(result, Err(ProbeError::FileNotFound(_))));
    }

    #[test]
    fn custom_path_is_used() {
        assert_eq!(Ffprobe::with_path("/opt/ff/ffprobe").program(), "/opt/ff/ffprobe");
    }
}
