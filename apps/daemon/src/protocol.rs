//! Wire protocol between the host and the daemon.
//!
//! The host writes one JSON object per line on stdin, tagged by `"type"`.
//! Host notifications carry the same fields as the event DTOs; user commands
//! name the application by `app_id`.

use pausegames_control::AppId;
use pausegames_events::{FocusChangeEvent, LaunchProgress, LifetimeNotification, RunningApp};
use pausegames_storage::Settings;
use serde::{Deserialize, Serialize};

/// Topic for commands the tracker rejected.
pub const COMMAND_FAILED: &str = "daemon:command_failed";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// The host's full list of running applications.
    RunningApps { apps: Vec<RunningApp> },
    Lifetime(LifetimeNotification),
    LaunchProgress(LaunchProgress),
    Focus(FocusChangeEvent),
    SuspendRequest,
    ResumeFromSuspend,

    SetPaused { app_id: AppId, paused: bool },
    Terminate { app_id: AppId },
    Kill { app_id: AppId },
    ResetSticky { app_id: AppId },
    SetSettings(Settings),
    Refresh,
}

impl HostMessage {
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RunningApps { .. } => "running_apps",
            Self::Lifetime(_) => "lifetime",
            Self::LaunchProgress(_) => "launch_progress",
            Self::Focus(_) => "focus",
            Self::SuspendRequest => "suspend_request",
            Self::ResumeFromSuspend => "resume_from_suspend",
            Self::SetPaused { .. } => "set_paused",
            Self::Terminate { .. } => "terminate",
            Self::Kill { .. } => "kill",
            Self::ResetSticky { .. } => "reset_sticky",
            Self::SetSettings(_) => "set_settings",
            Self::Refresh => "refresh",
        }
    }
}

/// Payload of [`COMMAND_FAILED`].
#[derive(Debug, Clone, Serialize)]
pub struct CommandFailed {
    pub command: &'static str,
    pub app_id: Option<AppId>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notifications() {
        let msg = HostMessage::parse(r#"{"type":"lifetime","pid":10,"running":false}"#).unwrap();
        assert_eq!(
            msg,
            HostMessage::Lifetime(LifetimeNotification {
                pid: 10,
                ..Default::default()
            })
        );

        let msg = HostMessage::parse(
            r#"{"type":"running_apps","apps":[{"app_id":"100","display_name":"Celeste"}]}"#,
        )
        .unwrap();
        let HostMessage::RunningApps { apps } = msg else {
            panic!("wrong variant");
        };
        assert_eq!(apps[0].app_id.as_str(), "100");
        assert_eq!(apps[0].display_name.as_deref(), Some("Celeste"));

        assert_eq!(
            HostMessage::parse(r#"{"type":"suspend_request"}"#).unwrap(),
            HostMessage::SuspendRequest
        );
    }

    #[test]
    fn test_parse_commands() {
        let msg = HostMessage::parse(r#"{"type":"set_paused","app_id":"100","paused":true}"#).unwrap();
        assert_eq!(msg.name(), "set_paused");

        let msg = HostMessage::parse(r#"{"type":"set_settings","autoPause":true}"#).unwrap();
        assert_eq!(
            msg,
            HostMessage::SetSettings(Settings {
                auto_pause: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_numeric_app_id_is_accepted() {
        let msg = HostMessage::parse(r#"{"type":"set_paused","app_id":730,"paused":false}"#).unwrap();
        assert_eq!(
            msg,
            HostMessage::SetPaused {
                app_id: AppId::from("730"),
                paused: false,
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(HostMessage::parse(r#"{"type":"reboot"}"#).is_err());
        assert!(HostMessage::parse("not json").is_err());
    }
}
