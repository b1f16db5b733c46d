//! Logging setup.
//!
//! Everything in the engine logs through the `log` facade; this module only
//! wires the `env_logger` backend for binaries.

mod init;

pub use init::{init_logging, LoggingConfig};
