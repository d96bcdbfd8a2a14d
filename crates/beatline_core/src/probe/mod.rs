//! Media duration probing.
//!
//! Every beat's own audio file and movie are queried once per run, all
//! beats in parallel on a bounded pool. The external tool sits behind the
//! [`DurationProbe`] trait so the rest of the engine never spawns processes
//! directly.

mod ffprobe;
mod pool;
mod types;

pub use ffprobe::Ffprobe;
pub use pool::{probe_all, resolve_workers};
pub use types::{DurationProbe, MediaInfo, ProbeError, ProbeResult};
