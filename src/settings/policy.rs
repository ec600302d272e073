use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How strictly the user is held to a break once it is announced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SkipPolicy {
    Casual,
    #[default]
    Balanced,
    Hardcore,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FullScreenBehavior {
    #[default]
    Pause,
    Continue,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("delay must be at least one minute")]
    ZeroDelay,
}

/// Cadence and length of breaks. Treated as an immutable snapshot by the
/// scheduler; a new one is handed over through `update_settings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakPolicy {
    pub short_break_interval_minutes: u32,
    pub short_break_duration_seconds: u32,
    /// Interval preceding a long break. Falls back to the short interval.
    pub long_break_interval_minutes: Option<u32>,
    pub long_break_every_n_short_breaks: u32,
    pub long_break_duration_minutes: u32,
    pub heads_up_seconds: u32,
    pub skip_policy: SkipPolicy,
}

impl Default for BreakPolicy {
    fn default() -> Self {
        Self {
            short_break_interval_minutes: 20,
            short_break_duration_seconds: 20,
            long_break_interval_minutes: None,
            long_break_every_n_short_breaks: 4,
            long_break_duration_minutes: 5,
            heads_up_seconds: 10,
            skip_policy: SkipPolicy::Balanced,
        }
    }
}

impl BreakPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        let checks = [
            ("shortBreakIntervalMinutes", self.short_break_interval_minutes),
            ("shortBreakDurationSeconds", self.short_break_duration_seconds),
            (
                "longBreakIntervalMinutes",
                self.long_break_interval_minutes.unwrap_or(1),
            ),
            ("longBreakEveryNShortBreaks", self.long_break_every_n_short_breaks),
            ("longBreakDurationMinutes", self.long_break_duration_minutes),
            ("headsUpSeconds", self.heads_up_seconds),
        ];

        match checks.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(PolicyError::NotPositive { field: *field }),
            None => Ok(()),
        }
    }

    /// Whether the break following `short_breaks_completed` short breaks is
    /// a long one. Depends on the cycle counter only, never on the clock.
    pub fn is_long_break(&self, short_breaks_completed: u32) -> bool {
        let every = self.long_break_every_n_short_breaks.max(1);
        (short_breaks_completed + 1) % every == 0
    }

    pub fn interval_secs(&self, long: bool) -> u64 {
        let minutes = if long {
            self.long_break_interval_minutes
                .unwrap_or(self.short_break_interval_minutes)
        } else {
            self.short_break_interval_minutes
        };
        u64::from(minutes) * 60
    }

    pub fn break_duration_secs(&self, long: bool) -> u64 {
        if long {
            u64::from(self.long_break_duration_minutes) * 60
        } else {
            u64::from(self.short_break_duration_seconds)
        }
    }
}

/// Context-suppression settings consumed by the context monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub focus_apps: Vec<String>,
    pub meeting_keywords: Vec<String>,
    pub full_screen_behavior: FullScreenBehavior,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            focus_apps: ["code.exe", "devenv.exe", "notepad++.exe", "sublime_text.exe"]
                .map(String::from)
                .to_vec(),
            meeting_keywords: ["meeting", "call", "zoom", "teams", "webex", "discord"]
                .map(String::from)
                .to_vec(),
            full_screen_behavior: FullScreenBehavior::Pause,
        }
    }
}
