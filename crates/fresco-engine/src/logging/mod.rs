//! Logging setup.
//!
//! The library itself only emits through the `log` facade. Binaries call
//! [`init_logging`] early in `main` to install `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
