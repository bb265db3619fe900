use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// User-tunable timer durations. Minutes, not seconds, because that is the
/// granularity the caller works in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub focus_minutes: u64,
    pub short_break_minutes: u64,
    pub long_break_minutes: u64,
    /// Every Nth completed session earns the long break.
    pub sessions_per_long_break: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_per_long_break: 3,
        }
    }
}

impl TimerSettings {
    pub fn validate(&self) -> Result<()> {
        if self.focus_minutes == 0 {
            bail!("focus_minutes must be greater than zero");
        }
        if self.short_break_minutes == 0 || self.long_break_minutes == 0 {
            bail!("break durations must be greater than zero");
        }
        if self.sessions_per_long_break == 0 {
            bail!("sessions_per_long_break must be greater than zero");
        }
        Ok(())
    }

    pub fn focus_secs(&self) -> u64 {
        self.focus_minutes * 60
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct UserSettings {
    timer: TimerSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn timer(&self) -> TimerSettings {
        self.data.read().unwrap().timer.clone()
    }

    pub fn update_timer(&self, settings: TimerSettings) -> Result<()> {
        settings.validate()?;
        {
            let mut guard = self.data.write().unwrap();
            guard.timer = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

impl SettingsStore {
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("pomotimer-settings-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn defaults_match_classic_pomodoro() {
        let settings = TimerSettings::default();
        assert_eq!(settings.focus_minutes, 25);
        assert_eq!(settings.short_break_minutes, 5);
        assert_eq!(settings.long_break_minutes, 15);
        assert_eq!(settings.sessions_per_long_break, 3);
    }

    #[test]
    fn update_persists_and_survives_reload() {
        let path = temp_path();
        let store = SettingsStore::new(path.clone()).unwrap();
        let updated = TimerSettings {
            focus_minutes: 50,
            ..TimerSettings::default()
        };
        store.update_timer(updated.clone()).unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.timer(), updated);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_durations_are_rejected() {
        let path = temp_path();
        let store = SettingsStore::new(path.clone()).unwrap();
        let bad = TimerSettings {
            focus_minutes: 0,
            ..TimerSettings::default()
        };
        assert!(store.update_timer(bad).is_err());
        // the stored value is untouched
        assert_eq!(store.timer(), TimerSettings::default());
        let _ = fs::remove_file(path);
    }
}
