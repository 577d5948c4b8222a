//! # Configuration
//!
//! Resolution of the console configuration shared by the client, the edge
//! server, and the CLI.

pub mod console;

pub use console::{
    ApiConfig, ConfigError, ConsoleConfig, EdgeConfig, LogFormat, LoggingConfig, SessionConfig,
};
