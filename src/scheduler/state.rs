use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::BreakPolicy;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    Countdown,
    Break,
    /// Part of the status vocabulary; no transition enters it.
    Overtime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BreakKind {
    Short,
    Long,
}

impl BreakKind {
    pub fn is_long(self) -> bool {
        matches!(self, BreakKind::Long)
    }
}

/// Break lifecycle state. `next_break_at` is only meaningful in `Idle`,
/// `seconds_remaining` only in `Countdown` and `Break`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleState {
    pub phase: Phase,
    pub seconds_remaining: u64,
    pub next_break_at: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub short_breaks_completed_in_cycle: u32,
    pub long_breaks_completed: u32,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upcoming_break_kind(&self, policy: &BreakPolicy) -> BreakKind {
        if policy.is_long_break(self.short_breaks_completed_in_cycle) {
            BreakKind::Long
        } else {
            BreakKind::Short
        }
    }

    /// `next_break_at` is `None` when nothing is armed (paused scheduler).
    pub fn enter_idle(&mut self, next_break_at: Option<DateTime<Utc>>) {
        self.phase = Phase::Idle;
        self.seconds_remaining = 0;
        self.next_break_at = next_break_at;
    }

    pub fn enter_countdown(&mut self, seconds: u64) {
        self.phase = Phase::Countdown;
        self.seconds_remaining = seconds;
        self.next_break_at = None;
    }

    pub fn enter_break(&mut self, seconds: u64) {
        self.phase = Phase::Break;
        self.seconds_remaining = seconds;
        self.next_break_at = None;
    }

    /// One elapsed second of countdown or break; returns what is left.
    pub fn tick(&mut self) -> u64 {
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        self.seconds_remaining
    }

    /// Post-break bookkeeping. A long break closes the cycle.
    pub fn complete_break(&mut self, kind: BreakKind) {
        match kind {
            BreakKind::Long => {
                self.long_breaks_completed += 1;
                self.short_breaks_completed_in_cycle = 0;
            }
            BreakKind::Short => {
                self.short_breaks_completed_in_cycle += 1;
            }
        }
        self.enter_idle(None);
    }
}
