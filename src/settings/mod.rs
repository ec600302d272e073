mod policy;
mod presets;

pub use policy::{AppSettings, BreakPolicy, FullScreenBehavior, PolicyError, SkipPolicy};
pub use presets::{find_preset, ModePreset, MODE_PRESETS};

use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Source of the policy snapshots consumed by the scheduler and the context
/// monitor. Both read once at construction and again on explicit refresh.
pub trait SettingsProvider: Send + Sync {
    fn break_policy(&self) -> BreakPolicy;
    fn app_settings(&self) -> AppSettings;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    #[serde(rename = "break")]
    break_policy: BreakPolicy,
    #[serde(flatten)]
    app: AppSettings,
}

impl UserSettings {
    fn validate(&self) -> Result<()> {
        self.break_policy
            .validate()
            .map_err(|err| anyhow!("invalid break policy: {err}"))
    }
}

/// JSON-backed settings with defaults-merge on load. Every mutation is
/// validated before it replaces the in-memory copy and is then persisted.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match parse_settings(&contents) {
                Ok(data) => data,
                Err(err) => {
                    warn!(
                        "Ignoring settings at {}: {err:#}; falling back to defaults",
                        path.display()
                    );
                    UserSettings::default()
                }
            }
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn update_break_policy(&self, policy: BreakPolicy) -> Result<()> {
        self.mutate(|data| data.break_policy = policy)
    }

    pub fn update_app_settings(&self, app: AppSettings) -> Result<()> {
        self.mutate(|data| data.app = app)
    }

    pub fn apply_preset(&self, name: &str) -> Result<()> {
        let Some(preset) = find_preset(name) else {
            bail!("unknown mode preset: {name}");
        };
        self.mutate(|data| data.break_policy = preset.apply_to(&data.break_policy))
    }

    pub fn add_focus_app(&self, app: &str) -> Result<()> {
        self.mutate(|data| push_unique(&mut data.app.focus_apps, app))
    }

    pub fn remove_focus_app(&self, app: &str) -> Result<()> {
        self.mutate(|data| data.app.focus_apps.retain(|existing| existing != app))
    }

    pub fn add_meeting_keyword(&self, keyword: &str) -> Result<()> {
        self.mutate(|data| push_unique(&mut data.app.meeting_keywords, keyword))
    }

    pub fn remove_meeting_keyword(&self, keyword: &str) -> Result<()> {
        self.mutate(|data| data.app.meeting_keywords.retain(|existing| existing != keyword))
    }

    pub fn reset_to_defaults(&self) -> Result<()> {
        self.mutate(|data| *data = UserSettings::default())
    }

    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&*self.read()).context("Failed to serialize settings")
    }

    /// Replaces the current settings with `json` merged over defaults. An
    /// unparsable or invalid document leaves the current settings untouched.
    pub fn import_json(&self, json: &str) -> Result<()> {
        let imported = parse_settings(json)?;
        let mut guard = self.write();
        self.persist(&imported)?;
        *guard = imported;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data = parse_settings(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn mutate(&self, change: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self.write();
        let mut next = guard.clone();
        change(&mut next);
        next.validate()?;
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SettingsProvider for SettingsStore {
    fn break_policy(&self) -> BreakPolicy {
        self.read().break_policy.clone()
    }

    fn app_settings(&self) -> AppSettings {
        self.read().app.clone()
    }
}

/// Settings held only in memory, for embedding without a settings file.
pub struct MemorySettings {
    policy: RwLock<BreakPolicy>,
    app: RwLock<AppSettings>,
}

impl MemorySettings {
    pub fn new(policy: BreakPolicy, app: AppSettings) -> Self {
        Self {
            policy: RwLock::new(policy),
            app: RwLock::new(app),
        }
    }

    pub fn set_break_policy(&self, policy: BreakPolicy) {
        *self.policy.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = policy;
    }

    pub fn set_app_settings(&self, app: AppSettings) {
        *self.app.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = app;
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new(BreakPolicy::default(), AppSettings::default())
    }
}

impl SettingsProvider for MemorySettings {
    fn break_policy(&self) -> BreakPolicy {
        self.policy
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn app_settings(&self) -> AppSettings {
        self.app
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn parse_settings(contents: &str) -> Result<UserSettings> {
    let data: UserSettings =
        serde_json::from_str(contents).context("Failed to parse settings JSON")?;
    data.validate()?;
    Ok(data)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}
