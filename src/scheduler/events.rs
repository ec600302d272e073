use serde::Serialize;

use super::state::BreakKind;

/// Lifecycle notifications consumed by presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BreakEvent {
    BreakStart { duration_seconds: u64, kind: BreakKind },
    BreakEnd { kind: BreakKind },
    CountdownStart { seconds: u64 },
    Pause,
    Resume,
    Skip,
    Delay { minutes: u32 },
}

impl BreakEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BreakEvent::BreakStart { .. } => "breakStart",
            BreakEvent::BreakEnd { .. } => "breakEnd",
            BreakEvent::CountdownStart { .. } => "countdownStart",
            BreakEvent::Pause => "pause",
            BreakEvent::Resume => "resume",
            BreakEvent::Skip => "skip",
            BreakEvent::Delay { .. } => "delay",
        }
    }
}
