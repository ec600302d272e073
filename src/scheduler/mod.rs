pub mod controller;
pub mod events;
pub mod gate;
pub mod state;
mod timers;

pub use controller::{ScheduleStatus, Scheduler};
pub use events::BreakEvent;
pub use gate::{BreakGate, GatedAction};
pub use state::{BreakKind, Phase, ScheduleState};
