//! Launch completion.
//!
//! A freshly launched application exists before its reaper is queryable, so
//! resolution is retried for a short while once the host reports the launch
//! complete.

use crate::notify::Notifier;
use crate::registry::Registry;
use crate::retry::RetryPolicy;
use futures::future::join_all;
use pausegames_control::AppId;
use pausegames_events::ChangeReason;
use std::sync::Arc;
use tracing::debug;

pub struct LaunchCompletion {
    registry: Arc<Registry>,
    notifier: Notifier,
    retry: RetryPolicy,
}

impl LaunchCompletion {
    pub fn new(registry: Arc<Registry>, notifier: Notifier, retry: RetryPolicy) -> Self {
        Self {
            registry,
            notifier,
            retry,
        }
    }

    /// Resolve the launched application, or every unresolved entry when the
    /// host did not say which one launched, then push a fresh view.
    /// Returns how many entries are resolved afterwards.
    pub async fn on_launch_completed(&self, app_id: &AppId) -> usize {
        let apps = self.registry.sync_with_process_list().await.apps;

        let targets: Vec<AppId> = if app_id.is_known() {
            vec![app_id.clone()]
        } else {
            apps.iter()
                .filter(|app| !app.is_resolved() && app.app_id.is_known())
                .map(|app| app.app_id.clone())
                .collect()
        };
        debug!(?targets, "resolving launched applications");

        join_all(
            targets
                .iter()
                .map(|id| self.registry.resolve_with_retry(id, self.retry)),
        )
        .await;

        let tracked = self.registry.snapshot().await;
        join_all(tracked.iter().map(|app| self.registry.query_paused(app))).await;

        self.notifier.apps_changed(ChangeReason::LaunchCompleted).await;
        tracked.iter().filter(|app| app.is_resolved()).count()
    }
}
