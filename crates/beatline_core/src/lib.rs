//! Beatline core library.
//!
//! Reconciles a script of beats (voice-over clips, background movies, fixed
//! durations, implicit silence) into a per-beat timing table and one
//! continuous audio track.
//!
//! # Modules
//!
//! - [`models`]: script input and timing output types
//! - [`probe`]: concurrent media duration probing
//! - [`timeline`]: classification, grouping, reconciliation and assembly
//! - [`concat`]: ffmpeg filter graph and invocation
//! - [`orchestrator`]: end-to-end pipeline with cancellation
//! - [`config`]: TOML settings
//! - [`logging`]: tracing setup and per-run log files

pub mod concat;
pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod probe;
pub mod timeline;

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
