//! User-issued actions.

use crate::app::TrackedApplication;
use crate::error::{Result, TrackerError};
use crate::tracker::Tracker;
use pausegames_control::AppId;
use pausegames_events::ChangeReason;
use pausegames_storage::Settings;
use tracing::info;

/// Result of a manual pause or resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The backend acted. Carries the pause state read back afterwards.
    Applied { is_paused: bool },
    /// The backend declined; nothing changed.
    Unchanged,
}

impl Tracker {
    /// Pause or resume one application on the user's behalf.
    ///
    /// With auto-pause on, the entry becomes sticky so focus changes stop
    /// touching it.
    pub async fn set_paused(&self, app_id: &AppId, paused: bool) -> Result<ToggleOutcome> {
        let entry = self.resolved_entry(app_id).await?;
        let acted = if paused {
            self.registry.control().pause(entry.pid).await?
        } else {
            self.registry.control().resume(entry.pid).await?
        };
        if !acted {
            return Ok(ToggleOutcome::Unchanged);
        }

        let is_paused = self.registry.query_paused(&entry).await.unwrap_or(paused);
        self.registry
            .with_same_entry(&entry, |app| app.is_paused = is_paused)
            .await;
        if self.settings.current().auto_pause {
            self.registry.mark_sticky(app_id).await;
        }
        info!(app_id = %app_id, pid = entry.pid, is_paused, "manual pause toggle");

        self.notifier.apps_changed(ChangeReason::Manual).await;
        Ok(ToggleOutcome::Applied { is_paused })
    }

    /// Ask the application to exit. Removal follows its stop notification.
    pub async fn terminate(&self, app_id: &AppId) -> Result<bool> {
        let entry = self.resolved_entry(app_id).await?;
        let acted = self.registry.control().terminate(entry.pid).await?;
        info!(app_id = %app_id, pid = entry.pid, acted, "terminate requested");
        Ok(acted)
    }

    pub async fn kill(&self, app_id: &AppId) -> Result<bool> {
        let entry = self.resolved_entry(app_id).await?;
        let acted = self.registry.control().kill(entry.pid).await?;
        info!(app_id = %app_id, pid = entry.pid, acted, "kill requested");
        Ok(acted)
    }

    /// Hand the application back to focus reconciliation.
    pub async fn reset_sticky(&self, app_id: &AppId) -> Result<()> {
        if !self.registry.clear_sticky(app_id).await {
            return Err(TrackerError::NotTracked(app_id.clone()));
        }
        self.notifier.apps_changed(ChangeReason::Manual).await;
        Ok(())
    }

    /// Save new settings. Turning auto-pause off forgets every sticky
    /// override, so turning it back on starts from a clean slate.
    pub async fn update_settings(&self, settings: Settings) -> Result<()> {
        let previous = self.settings.replace(settings)?;
        info!(?previous, current = ?settings, "settings updated");

        if !settings.auto_pause && self.registry.clear_all_sticky().await > 0 {
            self.notifier.apps_changed(ChangeReason::Manual).await;
        }
        self.notifier.settings_changed(&settings);
        Ok(())
    }

    /// Re-read everything and push a fresh view.
    pub async fn refresh(&self) {
        self.sync_and_push(ChangeReason::Refresh).await;
    }

    /// Tracked entry with a resolved pid, or the reason there is none.
    async fn resolved_entry(&self, app_id: &AppId) -> Result<TrackedApplication> {
        let entry = self
            .registry
            .get(app_id)
            .await
            .ok_or_else(|| TrackerError::NotTracked(app_id.clone()))?;
        if !entry.is_resolved() {
            return Err(TrackerError::Unresolved(app_id.clone()));
        }
        Ok(entry)
    }
}
