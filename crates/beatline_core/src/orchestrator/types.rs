//! Run context and pipeline outputs.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::logging::RunLogger;
use crate::models::{MediaProbe, ReconciledBeat, Script};
use crate::timeline::{ConcatPlan, Group};

/// Progress callback: phase name, percent, message.
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only inputs of one render.
pub struct Context {
    pub script: Script,
    /// Run name, used in errors and as the log file name.
    pub run_name: String,
    /// Where the combined audio track is written.
    pub output_path: PathBuf,
    pub logger: Arc<RunLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        script: Script,
        run_name: impl Into<String>,
        output_path: impl Into<PathBuf>,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            script,
            run_name: run_name.into(),
            output_path: output_path.into(),
            logger,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback, if set.
    pub fn report_progress(&self, phase: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(phase, percent, message);
        }
    }
}

/// Everything reconciliation derives from a script.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Probe results, indexed by beat.
    pub probes: Vec<MediaProbe>,
    #[serde(skip)]
    pub groups: Vec<Group>,
    /// Final per-beat timing table.
    pub beats: Vec<ReconciledBeat>,
    pub plan: ConcatPlan,
}

impl Timeline {
    /// Length of the whole track in seconds.
    pub fn total_duration(&self) -> f64 {
        self.beats.last().map(ReconciledBeat::end_at).unwrap_or(0.0)
    }
}

/// Result of a completed render.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub timeline: Timeline,
    /// The written audio file.
    pub audio_path: PathBuf,
    /// ffmpeg arguments that produced it.
    pub command: Vec<String>,
}
