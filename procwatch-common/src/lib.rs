//! Shared logging and configuration for procwatch.

pub mod config;
pub mod logging;

pub use config::{ConfigSource, EnvError, EnvParser, Sourced};
pub use logging::{LogConfig, LogFormat, LoggingError, LoggingGuards, init_logging};
