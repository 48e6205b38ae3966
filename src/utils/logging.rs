//! Module-gated logging macros.
//!
//! Each module that uses these declares its own switch:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_error, log_info, log_warn};
//! ```
//! Lines are tagged with the calling module's path so SDK output can be filtered
//! with `RUST_LOG=recon_core::script=debug` and friends.

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: module_path!(), $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: module_path!(), $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: module_path!(), $($arg)*);
        }
    };
}

/// Verbose per-step tracing; compiled in, but silent unless the module opts in
/// and `RUST_LOG` enables debug for it.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: module_path!(), $($arg)*);
        }
    };
}
