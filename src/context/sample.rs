use serde::{Deserialize, Serialize};

use crate::settings::{AppSettings, FullScreenBehavior};

pub const IDLE_THRESHOLD_SECS: u64 = 300;
pub const FULL_SCREEN_TOLERANCE_PX: f64 = 10.0;

const MEETING_APPS: [&str; 5] = ["zoom", "teams", "webex", "discord", "skype"];
const EXECUTABLE_SUFFIXES: [&str; 3] = [".exe", ".app", ".bin"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// All four edges within `tolerance` pixels (inclusive).
    pub fn matches(&self, other: &Bounds, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWindow {
    pub process_name: String,
    pub title: String,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SuppressReason {
    Idle,
    FullScreen,
    FocusApp,
    Meeting,
}

/// Suppression settings, pre-normalised once per settings refresh so each
/// poll only does substring checks.
#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionRules {
    pub idle_threshold_secs: u64,
    pub full_screen_behavior: FullScreenBehavior,
    focus_apps: Vec<String>,
    meeting_keywords: Vec<String>,
}

impl SuppressionRules {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            idle_threshold_secs: IDLE_THRESHOLD_SECS,
            full_screen_behavior: settings.full_screen_behavior,
            focus_apps: settings
                .focus_apps
                .iter()
                .map(|app| normalize_process_name(app))
                .filter(|app| !app.is_empty())
                .collect(),
            meeting_keywords: settings
                .meeting_keywords
                .iter()
                .map(|keyword| keyword.trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    pub fn is_focus_app(&self, process_name: &str) -> bool {
        let process = normalize_process_name(process_name);
        !process.is_empty() && self.focus_apps.iter().any(|app| process.contains(app.as_str()))
    }

    pub fn is_meeting(&self, process_name: &str, window_title: &str) -> bool {
        let process = normalize_process_name(process_name);
        let is_meeting_app =
            !process.is_empty() && MEETING_APPS.iter().any(|app| process.contains(app));

        let title = window_title.to_lowercase();
        let has_keyword = self
            .meeting_keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()));

        is_meeting_app || has_keyword
    }
}

impl Default for SuppressionRules {
    fn default() -> Self {
        Self::from_settings(&AppSettings::default())
    }
}

/// One observation of the user's context.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextSample {
    pub is_idle: bool,
    pub is_full_screen: bool,
    pub active_process_name: String,
    pub active_window_title: String,
    pub is_in_focus_app: bool,
    pub is_in_meeting: bool,
    pub should_suppress: bool,
    /// First matching rule in priority order: idle, full screen, focus
    /// app, meeting.
    pub reason: Option<SuppressReason>,
}

impl ContextSample {
    /// `window` is `None` when there is no active window or it could not be
    /// read; the window-derived flags are then all false.
    pub fn evaluate(
        rules: &SuppressionRules,
        idle_seconds: u64,
        window: Option<&ActiveWindow>,
        displays: &[Bounds],
    ) -> Self {
        let is_idle = idle_seconds > rules.idle_threshold_secs;

        let (is_full_screen, is_in_focus_app, is_in_meeting) = match window {
            Some(window) => (
                is_full_screen(&window.bounds, displays),
                rules.is_focus_app(&window.process_name),
                rules.is_meeting(&window.process_name, &window.title),
            ),
            None => (false, false, false),
        };

        let reason = if is_idle {
            Some(SuppressReason::Idle)
        } else if is_full_screen && rules.full_screen_behavior == FullScreenBehavior::Pause {
            Some(SuppressReason::FullScreen)
        } else if is_in_focus_app {
            Some(SuppressReason::FocusApp)
        } else if is_in_meeting {
            Some(SuppressReason::Meeting)
        } else {
            None
        };

        Self {
            is_idle,
            is_full_screen,
            active_process_name: window.map(|w| w.process_name.clone()).unwrap_or_default(),
            active_window_title: window.map(|w| w.title.clone()).unwrap_or_default(),
            is_in_focus_app,
            is_in_meeting,
            should_suppress: reason.is_some(),
            reason,
        }
    }
}

/// A window covering any connected display counts as full screen, whether
/// or not the platform flags it as such.
pub fn is_full_screen(window: &Bounds, displays: &[Bounds]) -> bool {
    displays
        .iter()
        .any(|display| window.matches(display, FULL_SCREEN_TOLERANCE_PX))
}

pub fn normalize_process_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    EXECUTABLE_SUFFIXES
        .iter()
        .find_map(|suffix| lowered.strip_suffix(suffix))
        .map(str::to_string)
        .unwrap_or(lowered)
}
