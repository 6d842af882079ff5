//! Shared utilities for txsync.

pub mod logging;

pub use logging::{init_logging, LogFormat, UnknownLogFormat};
