//! Logging infrastructure
//!
//! Library code only emits `tracing` events; the runner binary installs the
//! subscriber.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogGuard};
