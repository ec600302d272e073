use crate::settings::SkipPolicy;

use super::state::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Skip,
    Delay,
}

/// Checked by callers before they invoke `Scheduler::skip`/`delay`; the
/// scheduler itself accepts every call.
pub trait BreakGate: Send + Sync {
    fn permits(&self, action: GatedAction, phase: Phase) -> bool;
}

impl BreakGate for SkipPolicy {
    fn permits(&self, action: GatedAction, phase: Phase) -> bool {
        match (self, action) {
            (SkipPolicy::Casual, _) => true,
            (SkipPolicy::Balanced, GatedAction::Delay) => true,
            // Once the break is on screen it has to be taken.
            (SkipPolicy::Balanced, GatedAction::Skip) => phase == Phase::Countdown,
            (SkipPolicy::Hardcore, _) => false,
        }
    }
}
