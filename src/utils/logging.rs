//! Conditional, tagged logging macros.
//!
//! Each module using these macros defines two consts:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TAG: &str = "[scheduler]";
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("next break in {}s", secs);
//! ```
//! Output is prefixed with `LOG_TAG` so the scheduler and the context monitor
//! can be told apart in a single `RUST_LOG` stream.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!("{} {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!("{} {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

/// Warnings are used for degraded sensing; they never interrupt the caller.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!("{} {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!("{} {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}
