#[cfg(not(target_os = "linux"))]
use anyhow::bail;
use anyhow::Result;

use super::sample::{ActiveWindow, Bounds};

#[cfg(target_os = "linux")]
pub use super::x11::SystemProbe;

/// Raw platform signals. Every query may fail independently. A failed idle
/// query skips the whole poll; a failed window query means "no window".
pub trait ContextProbe: Send + Sync {
    /// Seconds since the last keyboard or pointer input.
    fn idle_seconds(&self) -> Result<u64>;

    /// `Ok(None)` when no window currently has focus.
    fn active_window(&self) -> Result<Option<ActiveWindow>>;

    fn displays(&self) -> Result<Vec<Bounds>>;
}

/// Placeholder on platforms without a sensing backend; every query fails,
/// so the monitor never reports suppression.
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Default)]
pub struct SystemProbe;

#[cfg(not(target_os = "linux"))]
impl SystemProbe {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "linux"))]
impl ContextProbe for SystemProbe {
    fn idle_seconds(&self) -> Result<u64> {
        bail!("idle detection is not supported on this platform")
    }

    fn active_window(&self) -> Result<Option<ActiveWindow>> {
        bail!("active window detection is not supported on this platform")
    }

    fn displays(&self) -> Result<Vec<Bounds>> {
        bail!("display enumeration is not supported on this platform")
    }
}
