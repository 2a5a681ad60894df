//! Logging utilities.
//!
//! Logger initialization on top of the `log` facade, plus the diagnostics
//! helpers the frame loop uses for its console output.

mod diagnostics;
mod init;

pub use diagnostics::{log_device_info, log_section};
pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
