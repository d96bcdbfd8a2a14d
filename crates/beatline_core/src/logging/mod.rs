//! Logging infrastructure.
//!
//! - `init_tracing` installs the process-wide `tracing` subscriber
//! - `RunLogger` writes one log file per render with a tail buffer of tool output
//!
//! # Example
//!
//! ```no_run
//! use beatline_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("lesson_01", "/tmp/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Probe");
//! logger.success("Rendered 3 beats");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level`. Output goes to stderr. Calling this
/// twice is a no-op.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
