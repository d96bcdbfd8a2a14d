//! Ordering of concatenation inputs.

use serde::Serialize;

use super::error::{TimelineError, TimelineResult};
use crate::models::{Beat, MediaSource, ReconciledBeat};

/// One segment of the final audio track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConcatInput {
    /// A beat's own audio file, trimmed to its probed length.
    Audio {
        beat: usize,
        source: MediaSource,
        duration: f64,
    },
    /// `duration` seconds of the shared silence source, from sub-range `slice`.
    Silence {
        beat: usize,
        slice: usize,
        duration: f64,
    },
}

impl ConcatInput {
    /// Beat this segment belongs to.
    pub fn beat(&self) -> usize {
        match self {
            ConcatInput::Audio { beat, .. } | ConcatInput::Silence { beat, .. } => *beat,
        }
    }

    /// Length of the segment in seconds.
    pub fn duration(&self) -> f64 {
        match self {
            ConcatInput::Audio { duration, .. } | ConcatInput::Silence { duration, .. } => {
                *duration
            }
        }
    }
}

/// Ordered segments plus the number of silence sub-ranges they consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConcatPlan {
    pub inputs: Vec<ConcatInput>,
    /// How many disjoint slices the silence source is split into.
    pub silence_slices: usize,
}

impl ConcatPlan {
    /// Total length of the assembled track.
    pub fn total_duration(&self) -> f64 {
        self.inputs.iter().map(ConcatInput::duration).sum()
    }

    /// Audio file inputs in order.
    pub fn audio_inputs(&self) -> impl Iterator<Item = &ConcatInput> {
        self.inputs
            .iter()
            .filter(|i| matches!(i, ConcatInput::Audio { .. }))
    }

    /// No audio and no silence: nothing for ffmpeg to concatenate.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Whether the silence source is needed at all.
    pub fn needs_silence(&self) -> bool {
        self.silence_slices > 0
    }
}

/// Build the ordered concatenation inputs from reconciled beats.
///
/// Each beat contributes its own audio (if any) followed by its silence (if
/// any). Silence slices are numbered in beat order and each is used once.
pub fn assemble(beats: &[Beat], reconciled: &[ReconciledBeat]) -> TimelineResult<ConcatPlan> {
    let mut plan = ConcatPlan::default();

    for (index, (beat, timing)) in beats.iter().zip(reconciled).enumerate() {
        if timing.audio_duration > 0.0 {
            let source = beat
                .audio_file
                .clone()
                .ok_or(TimelineError::MissingAudioFile { beat: index })?;
            plan.inputs.push(ConcatInput::Audio {
                beat: index,
                source,
                duration: timing.audio_duration,
            });
        }

        if timing.silence_duration > 0.0 {
            plan.inputs.push(ConcatInput::Silence {
                beat: index,
                slice: plan.silence_slices,
                duration: timing.silence_duration,
            });
            plan.silence_slices += 1;
        }
    }

    tracing::debug!(
        "Assembled {} inputs ({} silence slices, {:.3}s)",
        plan.inputs.len(),
        plan.silence_slices,
        plan.total_duration()
    );

    Ok(plan)
}
