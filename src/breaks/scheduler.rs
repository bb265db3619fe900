//! Short/long break cadence, decided purely from the running count of
//! completed sessions. The scheduler consumes `SessionCompleted` events and
//! shares no other state with the lifecycle engine.

use serde::{Deserialize, Serialize};

use crate::settings::TimerSettings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BreakKind {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BreakPlan {
    pub kind: BreakKind,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakConfig {
    pub short_secs: u64,
    pub long_secs: u64,
    /// Every Nth completed session earns the long break.
    pub cadence: u32,
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            short_secs: 5 * 60,
            long_secs: 15 * 60,
            cadence: 3,
        }
    }
}

impl From<&TimerSettings> for BreakConfig {
    fn from(settings: &TimerSettings) -> Self {
        Self {
            short_secs: settings.short_break_minutes * 60,
            long_secs: settings.long_break_minutes * 60,
            cadence: settings.sessions_per_long_break,
        }
    }
}

/// The break earned by the `completed_count`-th completion (1-based).
pub fn plan_break(completed_count: u64, config: &BreakConfig) -> BreakPlan {
    let cadence = config.cadence.max(1) as u64;
    if completed_count > 0 && completed_count % cadence == 0 {
        BreakPlan {
            kind: BreakKind::Long,
            duration_secs: config.long_secs,
        }
    } else {
        BreakPlan {
            kind: BreakKind::Short,
            duration_secs: config.short_secs,
        }
    }
}

/// Counts completions and hands out the next plan. Feed it one
/// `on_session_completed` call per `SessionCompleted` event.
#[derive(Debug, Clone)]
pub struct BreakScheduler {
    completed_count: u64,
    config: BreakConfig,
}

impl BreakScheduler {
    pub fn new(config: BreakConfig) -> Self {
        Self {
            completed_count: 0,
            config,
        }
    }

    pub fn on_session_completed(&mut self) -> BreakPlan {
        self.completed_count += 1;
        plan_break(self.completed_count, &self.config)
    }

    pub fn completed_count(&self) -> u64 {
        self.completed_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_completion_earns_the_long_break() {
        let mut scheduler = BreakScheduler::new(BreakConfig::default());
        assert_eq!(scheduler.on_session_completed().kind, BreakKind::Short);
        assert_eq!(scheduler.on_session_completed().kind, BreakKind::Short);
        assert_eq!(scheduler.on_session_completed().kind, BreakKind::Long);
        // the cycle restarts after a long break
        assert_eq!(scheduler.on_session_completed().kind, BreakKind::Short);
    }

    #[test]
    fn durations_come_from_the_config() {
        let config = BreakConfig {
            short_secs: 120,
            long_secs: 600,
            cadence: 2,
        };
        assert_eq!(plan_break(1, &config).duration_secs, 120);
        let long = plan_break(2, &config);
        assert_eq!(long.kind, BreakKind::Long);
        assert_eq!(long.duration_secs, 600);
    }

    #[test]
    fn zero_completions_never_plan_a_long_break() {
        assert_eq!(plan_break(0, &BreakConfig::default()).kind, BreakKind::Short);
    }

    #[test]
    fn config_derives_from_timer_settings() {
        let settings = TimerSettings::default();
        let config = BreakConfig::from(&settings);
        assert_eq!(config.short_secs, 300);
        assert_eq!(config.long_secs, 900);
        assert_eq!(config.cadence, 3);
    }
}
