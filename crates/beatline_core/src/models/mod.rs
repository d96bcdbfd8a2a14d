//! Data models for the beat timeline engine.
//!
//! This module contains the core data structures shared by every phase:
//! - Script input (beats, media sources, presentation-style audio params)
//! - Derived per-beat media probes
//! - The reconciled timing table handed to downstream video assembly

mod beat;
mod timing;

pub use beat::{
    AudioParams, Beat, BeatAudioParams, BeatImage, MediaSource, MovieParams, Script,
    ScriptAudioParams,
};
pub use timing::{MediaProbe, ReconciledBeat};
