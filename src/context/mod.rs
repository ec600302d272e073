pub mod controller;
mod loop_worker;
pub mod probe;
pub mod sample;
#[cfg(target_os = "linux")]
mod x11;

pub use controller::{ContextMonitor, POLL_INTERVAL};
pub use loop_worker::ContextChanged;
pub use probe::{ContextProbe, SystemProbe};
pub use sample::{
    ActiveWindow, Bounds, ContextSample, SuppressReason, SuppressionRules,
    FULL_SCREEN_TOLERANCE_PX, IDLE_THRESHOLD_SECS,
};
