//! Routes host messages to the tracker.
//!
//! Notifications go through the hub so the mounted loops handle them exactly
//! as they would in-process. Commands call the tracker directly; a rejected
//! command is logged and reported on the bus.

use crate::protocol::{CommandFailed, HostMessage, COMMAND_FAILED};
use pausegames_control::AppId;
use pausegames_events::{EventBusRef, NotificationHub, SystemSignal};
use pausegames_tracker::{SharedProcessList, Tracker, TrackerError};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Bridge {
    tracker: Arc<Tracker>,
    hub: NotificationHub,
    processes: Arc<SharedProcessList>,
    bus: EventBusRef,
}

impl Bridge {
    pub fn new(
        tracker: Arc<Tracker>,
        hub: NotificationHub,
        processes: Arc<SharedProcessList>,
        bus: EventBusRef,
    ) -> Self {
        Self {
            tracker,
            hub,
            processes,
            bus,
        }
    }

    /// Parse and handle one input line. Blank and malformed lines are skipped.
    pub async fn handle_line(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match HostMessage::parse(line) {
            Ok(message) => self.handle(message).await,
            Err(e) => warn!(error = %e, "ignoring malformed host message"),
        }
    }

    pub async fn handle(&self, message: HostMessage) {
        let name = message.name();
        debug!(message = name, "host message");

        let delivered = match message {
            HostMessage::RunningApps { apps } => {
                self.processes.replace(apps);
                self.tracker.refresh().await;
                return;
            }
            HostMessage::Lifetime(event) => self.hub.publish_lifetime(event),
            HostMessage::LaunchProgress(event) => self.hub.publish_launch(event),
            HostMessage::Focus(event) => self.hub.publish_focus(event),
            HostMessage::SuspendRequest => self.hub.publish_system(SystemSignal::SuspendRequest),
            HostMessage::ResumeFromSuspend => {
                self.hub.publish_system(SystemSignal::ResumeFromSuspend)
            }

            HostMessage::SetPaused { app_id, paused } => {
                let result = self.tracker.set_paused(&app_id, paused).await;
                self.report(name, Some(app_id), result.map(|_| ()));
                return;
            }
            HostMessage::Terminate { app_id } => {
                let result = self.tracker.terminate(&app_id).await;
                self.report(name, Some(app_id), result.map(|_| ()));
                return;
            }
            HostMessage::Kill { app_id } => {
                let result = self.tracker.kill(&app_id).await;
                self.report(name, Some(app_id), result.map(|_| ()));
                return;
            }
            HostMessage::ResetSticky { app_id } => {
                let result = self.tracker.reset_sticky(&app_id).await;
                self.report(name, Some(app_id), result);
                return;
            }
            HostMessage::SetSettings(settings) => {
                let result = self.tracker.update_settings(settings).await;
                self.report(name, None, result);
                return;
            }
            HostMessage::Refresh => {
                self.tracker.refresh().await;
                return;
            }
        };

        if delivered == 0 {
            debug!(message = name, "no subscriber for notification");
        }
    }

    fn report(&self, command: &'static str, app_id: Option<AppId>, result: Result<(), TrackerError>) {
        let Err(e) = result else { return };
        warn!(command, app_id = ?app_id, error = %e, "command failed");
        let payload = CommandFailed {
            command,
            app_id,
            message: e.to_string(),
        };
        match serde_json::to_value(&payload) {
            Ok(value) => self.bus.emit(COMMAND_FAILED, value),
            Err(e) => warn!(error = %e, "failed to serialize command failure"),
        }
    }
}
