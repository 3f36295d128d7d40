//! Tracked application entity.

use pausegames_control::{AppId, GameId, Pid};
use pausegames_events::{AppSnapshot, RunningApp};
use serde::{Deserialize, Serialize};

/// One application known to be running or recently running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedApplication {
    pub app_id: AppId,
    pub legacy_game_id: GameId,
    pub display_name: Option<String>,
    /// Reaper pid, `0` while unresolved.
    pub pid: Pid,
    /// Last observed pause state. Refreshed before every decision.
    pub is_paused: bool,
    /// Only meaningful inside a suspend bracket.
    pub last_pause_state_before_suspend: bool,
    /// Manual override: focus reconciliation leaves this entry alone.
    pub sticky: bool,
}

impl TrackedApplication {
    pub fn new(app_id: impl Into<AppId>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn from_running(app: &RunningApp) -> Self {
        Self {
            app_id: app.app_id.clone(),
            legacy_game_id: app.legacy_game_id.clone(),
            display_name: app.display_name.clone(),
            ..Default::default()
        }
    }

    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = pid;
        self
    }

    /// Resolved entries accept pause, resume and query calls.
    pub fn is_resolved(&self) -> bool {
        self.pid != 0
    }

    /// Same logical application as a process list entry.
    pub fn is_same_app(&self, app: &RunningApp) -> bool {
        self.app_id.matches(&app.app_id) || self.legacy_game_id.matches(&app.legacy_game_id)
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            app_id: self.app_id.clone(),
            legacy_game_id: self.legacy_game_id.clone(),
            display_name: self.display_name.clone(),
            pid: self.pid,
            is_paused: self.is_paused,
            sticky: self.sticky,
            disabled: !self.is_resolved(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_snapshot_is_disabled() {
        let app = TrackedApplication::new("100");
        assert!(app.snapshot().disabled);
        assert!(!app.with_pid(4242).snapshot().disabled);
    }

    #[test]
    fn test_same_app_by_legacy_id() {
        let app = TrackedApplication {
            legacy_game_id: GameId::from("9001"),
            ..Default::default()
        };
        let running = RunningApp {
            legacy_game_id: GameId::from("9001"),
            ..Default::default()
        };
        assert!(app.is_same_app(&running));
        assert!(!app.is_same_app(&RunningApp::default()));
    }
}
