//! Configuration management.
//!
//! Settings live in one TOML file with a table per concern. Sections can be
//! rewritten individually without touching the others.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, ConcatSettings, ConfigSection, LoggingSettings, PathSettings, ProbeSettings,
    Settings,
};
