use serde::Serialize;

use super::policy::{BreakPolicy, SkipPolicy};

/// A named bundle of policy overrides. Fields left `None` keep whatever the
/// current policy already has.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModePreset {
    pub name: &'static str,
    pub description: &'static str,
    pub short_break_interval_minutes: Option<u32>,
    pub short_break_duration_seconds: Option<u32>,
    pub long_break_every_n_short_breaks: Option<u32>,
    pub long_break_duration_minutes: Option<u32>,
    pub skip_policy: Option<SkipPolicy>,
}

impl ModePreset {
    pub fn apply_to(&self, policy: &BreakPolicy) -> BreakPolicy {
        BreakPolicy {
            short_break_interval_minutes: self
                .short_break_interval_minutes
                .unwrap_or(policy.short_break_interval_minutes),
            short_break_duration_seconds: self
                .short_break_duration_seconds
                .unwrap_or(policy.short_break_duration_seconds),
            long_break_every_n_short_breaks: self
                .long_break_every_n_short_breaks
                .unwrap_or(policy.long_break_every_n_short_breaks),
            long_break_duration_minutes: self
                .long_break_duration_minutes
                .unwrap_or(policy.long_break_duration_minutes),
            skip_policy: self.skip_policy.unwrap_or(policy.skip_policy),
            ..policy.clone()
        }
    }
}

pub static MODE_PRESETS: [ModePreset; 4] = [
    ModePreset {
        name: "Balanced",
        description: "Standard 20-20-20 rule with balanced breaks",
        short_break_interval_minutes: Some(20),
        short_break_duration_seconds: Some(20),
        long_break_every_n_short_breaks: Some(4),
        long_break_duration_minutes: Some(5),
        skip_policy: Some(SkipPolicy::Balanced),
    },
    ModePreset {
        name: "Deep Focus",
        description: "Longer intervals for deep work sessions",
        short_break_interval_minutes: Some(45),
        short_break_duration_seconds: Some(15),
        long_break_every_n_short_breaks: Some(3),
        long_break_duration_minutes: Some(10),
        skip_policy: Some(SkipPolicy::Hardcore),
    },
    ModePreset {
        name: "Eye Care",
        description: "Frequent short breaks for eye health",
        short_break_interval_minutes: Some(15),
        short_break_duration_seconds: Some(30),
        long_break_every_n_short_breaks: Some(6),
        long_break_duration_minutes: Some(3),
        skip_policy: Some(SkipPolicy::Casual),
    },
    ModePreset {
        name: "Wellness",
        description: "Comprehensive wellness breaks",
        short_break_interval_minutes: Some(30),
        short_break_duration_seconds: Some(60),
        long_break_every_n_short_breaks: Some(2),
        long_break_duration_minutes: Some(15),
        skip_policy: Some(SkipPolicy::Balanced),
    },
];

pub fn find_preset(name: &str) -> Option<&'static ModePreset> {
    MODE_PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
}
