//! Pipeline orchestration.
//!
//! `AudioPipeline::reconcile` is the engine on its own: script in, timing
//! table and concatenation plan out. `AudioPipeline::run` adds the run
//! context around it (logging, progress, cancellation) and invokes ffmpeg.
//!
//! # Usage
//!
//! ```ignore
//! let pipeline = AudioPipeline::new(settings);
//! let ctx = Context::new(script, "lesson_01", "output/lesson_01.m4a", logger);
//! let output = pipeline.run(&ctx)?;
//! ```

mod errors;
mod pipeline;
mod types;

pub use errors::{Phase, PhaseError, PipelineError, PipelineResult};
pub use pipeline::{AudioPipeline, CancelHandle};
pub use types::{Context, ProgressCallback, RunOutput, Timeline};
