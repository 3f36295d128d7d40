//! Shared event contracts between the host, the tracker and subscribers.
//!
//! This crate defines the formal contracts (DTOs) for every notification the
//! host pushes in and every event the tracker pushes out. Using shared types
//! keeps the daemon protocol and the engine in agreement on field names.
//!
//! Also provides the `EventBus` trait for decoupled event emission and the
//! `NotificationHub` the host publishes into.

mod bus;
mod hub;

pub use bus::{EventBus, EventBusRef, InMemoryEventBus};
pub use hub::{NotificationHub, DEFAULT_CHANNEL_CAPACITY};

use pausegames_control::{AppId, GameId, Pid};
use serde::{Deserialize, Serialize};

/// Launch status meaning the application finished starting up.
pub const LAUNCH_COMPLETED_STATUS: &str = "Completed";

/// Application started or stopped.
///
/// Producers do not always know the full identity, so any field may be
/// zero or empty. Native applications report an app id; non-native ones
/// often only a pid and a legacy game id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeNotification {
    pub app_id: AppId,
    pub pid: Pid,
    pub legacy_game_id: GameId,
    pub running: bool,
}

/// Coarse launch progress. Fires several times while an application starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchProgress {
    /// Application being launched, if the host reported it.
    pub app_id: AppId,
    pub status: String,
}

impl LaunchProgress {
    pub fn is_complete(&self) -> bool {
        self.status == LAUNCH_COMPLETED_STATUS
    }
}

/// Window focus moved.
///
/// `focused_pid` is the pid of the focused process, usually a child of the
/// reaper rather than the reaper itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusChangeEvent {
    pub focused_app_id: AppId,
    pub focused_pid: Pid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_name: Option<String>,
}

/// Power management signals. No payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemSignal {
    SuspendRequest,
    ResumeFromSuspend,
}

/// One entry of the host's list of running applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunningApp {
    pub app_id: AppId,
    pub legacy_game_id: GameId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RunningApp {
    pub fn new(app_id: impl Into<AppId>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }
}

/// Subscriber view of a tracked application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub app_id: AppId,
    pub legacy_game_id: GameId,
    #[serde(default)]
    pub display_name: Option<String>,
    pub pid: Pid,
    pub is_paused: bool,
    pub sticky: bool,
    /// No pid resolved yet; pause and resume are unavailable.
    pub disabled: bool,
}

/// What triggered an `apps_changed` push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Mount,
    Lifecycle,
    LaunchCompleted,
    Focus,
    Suspend,
    Resume,
    Manual,
    Refresh,
}

/// Event emitted when the tracked set or any pause state changes.
///
/// Producers: tracker
/// Consumers: presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppsChangedEvent {
    pub apps: Vec<AppSnapshot>,
    pub reason: ChangeReason,
    /// Timestamp in milliseconds since epoch.
    pub timestamp_ms: i64,
}

impl AppsChangedEvent {
    pub fn new(apps: Vec<AppSnapshot>, reason: ChangeReason) -> Self {
        Self {
            apps,
            reason,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Tracked applications changed.
    pub const APPS_CHANGED: &str = "tracker:apps_changed";
    /// Settings were saved.
    pub const SETTINGS_CHANGED: &str = "tracker:settings_changed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifetime_deserialize_partial() {
        let json = r#"{"pid": 4242, "running": true}"#;
        let event: LifetimeNotification = serde_json::from_str(json).unwrap();
        assert_eq!(event.pid, 4242);
        assert!(event.running);
        assert!(!event.app_id.is_known());
        assert!(!event.legacy_game_id.is_known());
    }

    #[test]
    fn test_launch_progress_completion() {
        let json = r#"{"app_id": "730", "status": "Completed"}"#;
        let event: LaunchProgress = serde_json::from_str(json).unwrap();
        assert!(event.is_complete());

        let starting = LaunchProgress {
            status: "CreatingProcess".to_string(),
            ..Default::default()
        };
        assert!(!starting.is_complete());
    }

    #[test]
    fn test_system_signal_names() {
        let json = serde_json::to_string(&SystemSignal::ResumeFromSuspend).unwrap();
        assert_eq!(json, "\"resume_from_suspend\"");
    }

    #[test]
    fn test_apps_changed_carries_reason() {
        let event = AppsChangedEvent::new(Vec::new(), ChangeReason::Focus);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["reason"], "focus");
        assert!(value["timestamp_ms"].as_i64().unwrap() > 0);
    }
}
