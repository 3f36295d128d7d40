//! Lifecycle notification correlation.
//!
//! Start and stop notifications carry partial identity. They are matched to
//! a tracked entry clause by clause: every entry is checked for the same pid
//! first, then for the same app id, then for the same legacy id. The first
//! clause with a hit wins, and registry order breaks ties inside a clause.

use crate::app::TrackedApplication;
use crate::notify::Notifier;
use crate::registry::Registry;
use pausegames_control::AppId;
use pausegames_events::{ChangeReason, LifetimeNotification};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How a lifetime notification was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifetimeOutcome {
    /// Start matched an entry and filled in missing identity.
    Backfilled(AppId),
    /// Start matched an entry that already knew everything.
    Matched(AppId),
    /// Stop matched an entry; the registry reconciles after the grace delay.
    RemovalScheduled(AppId),
    Unmatched,
}

/// Index of the entry `event` refers to.
pub fn find_match(apps: &[TrackedApplication], event: &LifetimeNotification) -> Option<usize> {
    if event.pid != 0 {
        if let Some(index) = apps.iter().position(|app| app.pid == event.pid) {
            return Some(index);
        }
    }
    if let Some(index) = apps.iter().position(|app| app.app_id.matches(&event.app_id)) {
        return Some(index);
    }
    apps.iter()
        .position(|app| app.legacy_game_id.matches(&event.legacy_game_id))
}

/// Fill unknown fields of `apps[index]` from `event`. Known fields are never
/// overwritten, and a pid another entry already holds is not taken.
fn backfill(apps: &mut [TrackedApplication], index: usize, event: &LifetimeNotification) -> bool {
    let pid_claimed = event.pid != 0
        && apps
            .iter()
            .enumerate()
            .any(|(i, app)| i != index && app.pid == event.pid);

    let app = &mut apps[index];
    let mut changed = false;
    if app.pid == 0 && event.pid != 0 {
        if pid_claimed {
            debug!(app_id = %app.app_id, pid = event.pid, "pid already claimed, not backfilling");
        } else {
            app.pid = event.pid;
            changed = true;
        }
    }
    if !app.app_id.is_known() && event.app_id.is_known() {
        app.app_id = event.app_id.clone();
        changed = true;
    }
    if !app.legacy_game_id.is_known() && event.legacy_game_id.is_known() {
        app.legacy_game_id = event.legacy_game_id.clone();
        changed = true;
    }
    changed
}

pub struct LifecycleCorrelator {
    registry: Arc<Registry>,
    notifier: Notifier,
    grace: Duration,
}

impl LifecycleCorrelator {
    pub fn new(registry: Arc<Registry>, notifier: Notifier, grace: Duration) -> Self {
        Self {
            registry,
            notifier,
            grace,
        }
    }

    /// Handle one lifetime notification. A scheduled removal is abandoned if
    /// `cancel` fires before the grace delay elapses.
    pub async fn on_lifetime(
        &self,
        event: &LifetimeNotification,
        cancel: &CancellationToken,
    ) -> LifetimeOutcome {
        if event.running {
            self.on_start(event).await
        } else {
            self.on_stop(event, cancel).await
        }
    }

    async fn on_start(&self, event: &LifetimeNotification) -> LifetimeOutcome {
        let sync = self.registry.sync_with_process_list().await;

        let outcome = self
            .registry
            .with_apps(|apps| {
                let Some(index) = find_match(apps, event) else {
                    return LifetimeOutcome::Unmatched;
                };
                if backfill(apps, index, event) {
                    LifetimeOutcome::Backfilled(apps[index].app_id.clone())
                } else {
                    LifetimeOutcome::Matched(apps[index].app_id.clone())
                }
            })
            .await;

        debug!(?event, ?outcome, "application started");
        if sync.membership_changed() || matches!(outcome, LifetimeOutcome::Backfilled(_)) {
            self.notifier.apps_changed(ChangeReason::Lifecycle).await;
        }
        outcome
    }

    async fn on_stop(&self, event: &LifetimeNotification, cancel: &CancellationToken) -> LifetimeOutcome {
        let matched = self
            .registry
            .with_apps(|apps| find_match(apps, event).map(|index| apps[index].app_id.clone()))
            .await;

        let Some(app_id) = matched else {
            debug!(?event, "stop notification for untracked application");
            return LifetimeOutcome::Unmatched;
        };

        info!(app_id = %app_id, pid = event.pid, "application stopping");
        let registry = self.registry.clone();
        let notifier = self.notifier.clone();
        let cancel = cancel.clone();
        let grace = self.grace;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(grace) => {
                    let current = registry.process_list().running_apps();
                    let removed = registry.reconcile_with_process_list(&current).await;
                    if !removed.is_empty() {
                        notifier.apps_changed(ChangeReason::Lifecycle).await;
                    }
                }
            }
        });
        LifetimeOutcome::RemovalScheduled(app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pausegames_control::GameId;

    fn entry(app_id: &str, legacy: &str, pid: u32) -> TrackedApplication {
        TrackedApplication {
            app_id: AppId::from(app_id),
            legacy_game_id: GameId::from(legacy),
            pid,
            ..Default::default()
        }
    }

    fn event(app_id: &str, legacy: &str, pid: u32) -> LifetimeNotification {
        LifetimeNotification {
            app_id: AppId::from(app_id),
            legacy_game_id: GameId::from(legacy),
            pid,
            running: true,
        }
    }

    #[test]
    fn test_pid_clause_beats_earlier_app_id_match() {
        let apps = vec![entry("100", "", 0), entry("200", "", 4242)];
        assert_eq!(find_match(&apps, &event("100", "", 4242)), Some(1));
    }

    #[test]
    fn test_app_id_clause_beats_legacy_id() {
        let apps = vec![entry("", "9001", 0), entry("100", "", 0)];
        assert_eq!(find_match(&apps, &event("100", "9001", 0)), Some(1));
    }

    #[test]
    fn test_legacy_id_fallback() {
        let apps = vec![entry("100", "", 0), entry("", "9001", 0)];
        assert_eq!(find_match(&apps, &event("", "9001", 77)), Some(1));
    }

    #[test]
    fn test_placeholder_ids_never_match() {
        let apps = vec![entry("0", "0", 0)];
        assert_eq!(find_match(&apps, &event("0", "0", 0)), None);
        assert_eq!(find_match(&apps, &event("", "", 0)), None);
    }

    #[test]
    fn test_registry_order_breaks_ties() {
        let apps = vec![entry("100", "", 0), entry("100", "", 0)];
        assert_eq!(find_match(&apps, &event("100", "", 0)), Some(0));
    }

    #[test]
    fn test_backfill_fills_unknown_fields_only() {
        let mut apps = vec![entry("", "9001", 0)];
        assert!(backfill(&mut apps, 0, &event("100", "1234", 4242)));
        assert_eq!(apps[0].app_id.as_str(), "100");
        assert_eq!(apps[0].legacy_game_id.as_str(), "9001");
        assert_eq!(apps[0].pid, 4242);

        assert!(!backfill(&mut apps, 0, &event("100", "9001", 4242)));
    }

    #[test]
    fn test_backfill_never_overwrites_known_pid() {
        let mut apps = vec![entry("100", "", 10)];
        assert!(!backfill(&mut apps, 0, &event("100", "", 20)));
        assert_eq!(apps[0].pid, 10);
    }

    #[test]
    fn test_backfill_skips_claimed_pid() {
        let mut apps = vec![entry("100", "", 4242), entry("200", "", 0)];
        assert!(!backfill(&mut apps, 1, &event("200", "", 4242)));
        assert_eq!(apps[1].pid, 0);
    }
}
