//! Error types for the audio pipeline.
//!
//! Errors chain through layers: Run → Phase → Operation.

use std::fmt;

use thiserror::Error;

use crate::concat::ConcatError;
use crate::timeline::TimelineError;

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    Probe,
    Group,
    Reconcile,
    Assemble,
    Concat,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Validate => "Validate",
            Phase::Probe => "Probe",
            Phase::Group => "Group",
            Phase::Reconcile => "Reconcile",
            Phase::Assemble => "Assemble",
            Phase::Concat => "Concat",
        }
    }

    /// Progress percentage reported when the phase starts.
    pub fn progress(&self) -> u32 {
        match self {
            Phase::Validate => 0,
            Phase::Probe => 5,
            Phase::Group => 40,
            Phase::Reconcile => 45,
            Phase::Assemble => 55,
            Phase::Concat => 60,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Run '{run_name}' failed at phase '{phase}': {source}")]
    PhaseFailed {
        run_name: String,
        phase: Phase,
        #[source]
        source: PhaseError,
    },

    /// The script was rejected before any media was probed.
    #[error("Run '{run_name}' failed validation: {source}")]
    ValidationFailed {
        run_name: String,
        #[source]
        source: TimelineError,
    },

    #[error("Run '{run_name}' was cancelled")]
    Cancelled { run_name: String },

    #[error("Run '{run_name}' setup failed: {message}")]
    SetupFailed { run_name: String, message: String },
}

impl PipelineError {
    pub fn phase_failed(
        run_name: impl Into<String>,
        phase: Phase,
        source: impl Into<PhaseError>,
    ) -> Self {
        Self::PhaseFailed {
            run_name: run_name.into(),
            phase,
            source: source.into(),
        }
    }

    pub fn cancelled(run_name: impl Into<String>) -> Self {
        Self::Cancelled {
            run_name: run_name.into(),
        }
    }

    pub fn setup_failed(run_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_name: run_name.into(),
            message: message.into(),
        }
    }

    /// Phase the run stopped in, if it got that far.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::PhaseFailed { phase, .. } => Some(*phase),
            Self::ValidationFailed { .. } => Some(Phase::Validate),
            _ => None,
        }
    }
}

/// Error from a single phase.
#[derive(Error, Debug)]
pub enum PhaseError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Concat(#[from] ConcatError),
}

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_failure_names_run_and_phase() {
        let err = PipelineError::phase_failed(
            "lesson_01",
            Phase::Reconcile,
            TimelineError::DurationOverflow {
                beat: 2,
                audio: 7.0,
                remaining: 4.0,
            },
        );
        let msg = err.to_string();
        assert!(msg.starts_with("Run 'lesson_01' failed at phase 'Reconcile':"));
        assert_eq!(err.phase(), Some(Phase::Reconcile));
    }

    #[test]
    fn progress_increases_with_phase_order() {
        let phases = [
            Phase::Validate,
            Phase::Probe,
            Phase::Group,
            Phase::Reconcile,
            Phase::Assemble,
            Phase::Concat,
        ];
        assert!(phases.windows(2).all(|w| w[0].progress() < w[1].progress()));
    }
}
