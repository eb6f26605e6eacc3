//! Logging utilities
//!
//! Thin wrapper over `log`/`env_logger`; the dashboard host usually installs
//! its own logger, so initialization here is best-effort.

pub use log::{debug, error, info, trace, warn};

/// Initialize env_logger if no global logger is installed yet.
///
/// Safe to call more than once (tests, embedding hosts); later calls are
/// no-ops.
pub fn init() {
    let _ = env_logger::builder().is_test(false).try_init();
}
