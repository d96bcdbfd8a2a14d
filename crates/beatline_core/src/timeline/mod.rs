//! Beat timeline reconciliation.
//!
//! The timeline phases are pure functions composed by the orchestrator,
//! each taking the previous phase's output and returning a new value:
//!
//! 1. **Classification** (`classify`): what media each beat declares.
//! 2. **Grouping** (`grouping`): voice-over and spill-over runs.
//! 3. **Reconciliation** (`reconcile`): final durations, silence and start offsets.
//! 4. **Assembly** (`assemble`): ordered concatenation inputs.
//!
//! # Usage
//!
//! ```ignore
//! use beatline_core::timeline::{assemble, reconcile, resolve_groups};
//!
//! let probes = probe_all(&script.beats, &Ffprobe::new(), 0)?;
//! let groups = resolve_groups(&script.beats, &probes);
//! let table = reconcile(&script.beats, &probes, &groups, &params)?;
//! let plan = assemble(&script.beats, &table)?;
//! ```

mod assemble;
mod classify;
mod error;
mod grouping;
mod reconcile;

pub use assemble::{assemble, ConcatInput, ConcatPlan};
pub use classify::{classify, BeatKind};
pub use error::{TimelineError, TimelineResult};
pub use grouping::{resolve_groups, Group, GroupKind};
pub use reconcile::{reconcile, DEFAULT_BEAT_DURATION, MIN_SPILL_BEAT_DURATION, SPILL_TOLERANCE};
