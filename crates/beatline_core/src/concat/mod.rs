//! Final audio concatenation with ffmpeg.
//!
//! `FilterGraph` turns a `ConcatPlan` into ffmpeg arguments and
//! `ConcatInvoker` runs them with cancellation and an optional timeout.

mod filter_graph;
mod invoker;
mod types;

pub use filter_graph::{FilterGraph, OUTPUT_LABEL};
pub use invoker::ConcatInvoker;
pub use types::{ConcatError, ConcatResult};
