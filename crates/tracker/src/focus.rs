//! Focus reconciliation.
//!
//! With auto-pause on, the focused application runs and every other tracked
//! application is paused. Decisions are driven by throttled focus events and
//! are suppressed while an application is starting up, since pausing a
//! process mid-launch can wedge it.

use crate::app::TrackedApplication;
use crate::notify::Notifier;
use crate::policy::OVERLAY_APP_ID;
use crate::registry::Registry;
use crate::settings::SettingsHandle;
use futures::future::join_all;
use pausegames_control::{AppId, Pid};
use pausegames_events::{ChangeReason, FocusChangeEvent};
use pausegames_storage::Settings;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// How a focus event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusOutcome {
    StartingUp,
    /// Same pid as the previous accepted event.
    Duplicate,
    AutoPauseOff,
    /// The focused application could not be identified.
    Unresolved,
    Reconciled { changed: usize },
}

/// Who has focus once the event is normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FocusTarget {
    App { app_id: AppId, pid: Pid },
    /// The overlay itself, with overlay pausing enabled.
    Overlay,
}

impl FocusTarget {
    fn is_focused(&self, app: &TrackedApplication) -> bool {
        match self {
            Self::App { app_id, pid } => app.pid == *pid || app.app_id.matches(app_id),
            Self::Overlay => false,
        }
    }
}

pub struct FocusReconciler {
    registry: Arc<Registry>,
    settings: Arc<SettingsHandle>,
    notifier: Notifier,
    starting_up: AtomicBool,
    last_focused_pid: AtomicU32,
}

impl FocusReconciler {
    pub fn new(registry: Arc<Registry>, settings: Arc<SettingsHandle>, notifier: Notifier) -> Self {
        Self {
            registry,
            settings,
            notifier,
            starting_up: AtomicBool::new(false),
            last_focused_pid: AtomicU32::new(0),
        }
    }

    pub fn set_starting_up(&self, starting_up: bool) {
        if self.starting_up.swap(starting_up, Ordering::SeqCst) != starting_up {
            debug!(starting_up, "launch state changed");
        }
    }

    pub fn is_starting_up(&self) -> bool {
        self.starting_up.load(Ordering::SeqCst)
    }

    /// Run one focus decision to completion.
    pub async fn on_focus(&self, event: &FocusChangeEvent) -> FocusOutcome {
        if self.is_starting_up() {
            return FocusOutcome::StartingUp;
        }
        if self.last_focused_pid.swap(event.focused_pid, Ordering::SeqCst) == event.focused_pid {
            return FocusOutcome::Duplicate;
        }
        let settings = self.settings.current();
        if !settings.auto_pause {
            return FocusOutcome::AutoPauseOff;
        }

        let Some(target) = self.normalize(event, &settings).await else {
            debug!(?event, "focused application not identified");
            return FocusOutcome::Unresolved;
        };
        debug!(?target, "reconciling focus");

        let apps = self.registry.sync_with_process_list().await.apps;
        let results = join_all(
            apps.iter()
                .filter(|app| app.is_resolved() && !app.sticky)
                .map(|app| self.reconcile_entry(app, &target)),
        )
        .await;

        let changed = results.into_iter().filter(|changed| *changed).count();
        if changed > 0 {
            self.notifier.apps_changed(ChangeReason::Focus).await;
        }
        FocusOutcome::Reconciled { changed }
    }

    /// Map the raw event to the focused reaper. The reported pid belongs to
    /// a child, and the overlay reports its own app id over whatever game it
    /// is drawn on.
    async fn normalize(&self, event: &FocusChangeEvent, settings: &Settings) -> Option<FocusTarget> {
        let control = self.registry.control();
        let is_overlay = event.focused_app_id.as_str() == OVERLAY_APP_ID;

        let mut app_id = event.focused_app_id.clone();
        if !app_id.is_known() || is_overlay {
            let owner = match control.app_id_from_pid(event.focused_pid).await {
                Ok(owner) => owner,
                Err(e) => {
                    warn!(pid = event.focused_pid, error = %e, "app id lookup failed");
                    AppId::unknown()
                }
            };
            if owner.is_known() {
                app_id = owner;
            } else if is_overlay && settings.overlay_pause {
                return Some(FocusTarget::Overlay);
            } else {
                return None;
            }
        }

        match control.pid_from_app_id(&app_id).await {
            Ok(0) => None,
            Ok(pid) => Some(FocusTarget::App { app_id, pid }),
            Err(e) => {
                warn!(app_id = %app_id, error = %e, "pid lookup failed");
                None
            }
        }
    }

    /// Bring one entry in line with the focus. True if its state moved.
    async fn reconcile_entry(&self, app: &TrackedApplication, target: &FocusTarget) -> bool {
        let Some(paused) = self.registry.query_paused(app).await else {
            return false;
        };
        let mut changed = paused != app.is_paused;

        let focused = target.is_focused(app);
        if focused == paused {
            let acted = self.registry.apply_pause(app, !focused).await == Some(true);
            changed |= acted;
        }
        changed
    }
}
