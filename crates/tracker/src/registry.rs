//! Tracked application registry.
//!
//! The in-memory table of applications plus the identifier resolution that
//! fills in their pids. The table lock is never held across a backend call:
//! every write that follows an awaited lookup re-validates that the entry it
//! targets still exists with the identity it had before the await, because a
//! stop notification may have removed it in the meantime.

use crate::app::TrackedApplication;
use crate::process_list::ProcessListRef;
use crate::retry::RetryPolicy;
use futures::future::join_all;
use pausegames_control::{AppId, Pid, ProcessControlRef};
use pausegames_events::RunningApp;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of syncing the registry with the process list.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Tracked entries in process list order.
    pub apps: Vec<TrackedApplication>,
    pub created: usize,
    pub removed: Vec<TrackedApplication>,
}

impl SyncOutcome {
    pub fn membership_changed(&self) -> bool {
        self.created > 0 || !self.removed.is_empty()
    }
}

pub struct Registry {
    control: ProcessControlRef,
    process_list: ProcessListRef,
    apps: Mutex<Vec<TrackedApplication>>,
}

impl Registry {
    pub fn new(control: ProcessControlRef, process_list: ProcessListRef) -> Self {
        Self {
            control,
            process_list,
            apps: Mutex::new(Vec::new()),
        }
    }

    pub fn control(&self) -> &ProcessControlRef {
        &self.control
    }

    pub fn process_list(&self) -> &ProcessListRef {
        &self.process_list
    }

    /// Copy of every tracked entry in registry order.
    pub async fn snapshot(&self) -> Vec<TrackedApplication> {
        self.apps.lock().await.clone()
    }

    pub async fn get(&self, app_id: &AppId) -> Option<TrackedApplication> {
        self.apps
            .lock()
            .await
            .iter()
            .find(|app| app.app_id.matches(app_id))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.apps.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.apps.lock().await.is_empty()
    }

    /// Run `f` against the whole table under the lock.
    pub(crate) async fn with_apps<R>(&self, f: impl FnOnce(&mut Vec<TrackedApplication>) -> R) -> R {
        let mut apps = self.apps.lock().await;
        f(&mut apps)
    }

    /// Run `f` against the entry for `app_id`, if tracked.
    pub(crate) async fn with_entry<R>(
        &self,
        app_id: &AppId,
        f: impl FnOnce(&mut TrackedApplication) -> R,
    ) -> Option<R> {
        let mut apps = self.apps.lock().await;
        apps.iter_mut().find(|app| app.app_id.matches(app_id)).map(f)
    }

    /// Run `f` against the entry that still has this identity.
    pub(crate) async fn with_same_entry<R>(
        &self,
        entry: &TrackedApplication,
        f: impl FnOnce(&mut TrackedApplication) -> R,
    ) -> Option<R> {
        let mut apps = self.apps.lock().await;
        apps.iter_mut()
            .find(|app| app.pid == entry.pid && app.app_id == entry.app_id)
            .map(f)
    }

    /// Return the entry for `app_id`, creating it if needed.
    ///
    /// Metadata comes from the process list when it knows the application.
    /// An unresolved entry gets a single resolution attempt; failing that it
    /// stays disabled, which is a valid outcome. An unknown `app_id` cannot be
    /// tracked and yields a detached, disabled entry.
    pub async fn get_or_create(&self, app_id: &AppId) -> TrackedApplication {
        if !app_id.is_known() {
            return TrackedApplication::new(app_id.clone());
        }
        let running = self.running_app(app_id);
        self.get_or_create_from(&running).await.0
    }

    /// Process list entry for `app_id`, or a bare one if the list lacks it.
    fn running_app(&self, app_id: &AppId) -> RunningApp {
        self.process_list
            .running_apps()
            .into_iter()
            .find(|app| app.app_id.matches(app_id))
            .unwrap_or_else(|| RunningApp::new(app_id.clone()))
    }

    /// Like [`get_or_create`](Self::get_or_create) but keyed on a process
    /// list entry. Also reports whether the entry was created.
    async fn get_or_create_from(&self, running: &RunningApp) -> (TrackedApplication, bool) {
        let (entry, created) = {
            let mut apps = self.apps.lock().await;
            match apps.iter_mut().find(|app| app.is_same_app(running)) {
                Some(app) => {
                    adopt_metadata(app, running);
                    (app.clone(), false)
                }
                None => {
                    let app = TrackedApplication::from_running(running);
                    debug!(app_id = %app.app_id, "tracking application");
                    apps.push(app.clone());
                    (app, true)
                }
            }
        };

        if entry.is_resolved() || !entry.app_id.is_known() {
            return (entry, created);
        }

        let pid = self.lookup_pid(&entry.app_id).await;
        if pid == 0 {
            return (entry, created);
        }
        let claimed = self.claim_resolved_pid(&entry.app_id, pid).await;
        (claimed.unwrap_or(entry), created)
    }

    /// One backend lookup. Failures are logged and read as unresolved.
    async fn lookup_pid(&self, app_id: &AppId) -> Pid {
        if !app_id.is_known() {
            return 0;
        }
        match self.control.pid_from_app_id(app_id).await {
            Ok(pid) => pid,
            Err(e) => {
                warn!(app_id = %app_id, error = %e, "pid lookup failed");
                0
            }
        }
    }

    /// Store a pid the backend resolved for `app_id`.
    ///
    /// The backend's answer is authoritative, so another entry still claiming
    /// the same pid loses it. An entry that got resolved while we were waiting
    /// keeps its pid. Returns `None` if the entry was removed meanwhile.
    async fn claim_resolved_pid(&self, app_id: &AppId, pid: Pid) -> Option<TrackedApplication> {
        let mut apps = self.apps.lock().await;
        let index = apps.iter().position(|app| app.app_id.matches(app_id))?;
        if apps[index].is_resolved() {
            return Some(apps[index].clone());
        }
        for (i, other) in apps.iter_mut().enumerate() {
            if i != index && other.pid == pid {
                warn!(app_id = %other.app_id, pid, "dropping stale pid claim");
                other.pid = 0;
            }
        }
        apps[index].pid = pid;
        info!(app_id = %app_id, pid, "resolved application process");
        Some(apps[index].clone())
    }

    /// Resolve the pid of a freshly launched application.
    ///
    /// The process should exist but may not be queryable yet, so the lookup
    /// is retried under `policy`. Gives up silently: nothing is created and
    /// `0` is returned when every attempt fails.
    pub async fn resolve_with_retry(&self, app_id: &AppId, policy: RetryPolicy) -> Pid {
        if !app_id.is_known() {
            return 0;
        }
        if let Some(existing) = self.get(app_id).await.filter(|app| app.is_resolved()) {
            return existing.pid;
        }

        let resolved = policy
            .run(|attempt| async move {
                let pid = self.lookup_pid(app_id).await;
                if pid == 0 {
                    debug!(app_id = %app_id, attempt, "pid not resolvable yet");
                }
                (pid != 0).then_some(pid)
            })
            .await;

        let Some(pid) = resolved else {
            debug!(app_id = %app_id, attempts = policy.max_attempts, "giving up on pid resolution");
            return 0;
        };

        let running = self.running_app(app_id);
        self.with_apps(|apps| {
            if !apps.iter().any(|app| app.app_id.matches(app_id)) {
                apps.push(TrackedApplication::from_running(&running));
            }
        })
        .await;
        self.claim_resolved_pid(app_id, pid)
            .await
            .map(|app| app.pid)
            .unwrap_or(0)
    }

    /// Fresh pause state for `app_id`. `None` if the entry is unresolved or
    /// the query failed; the caller then treats the entity as inert.
    pub async fn refresh_pause_state(&self, app_id: &AppId) -> Option<bool> {
        let entry = self.get(app_id).await?;
        self.query_paused(&entry).await
    }

    /// Query the backend for `entry` and record the answer if the entry is
    /// still tracked with the same pid. On failure the last known value stays.
    pub(crate) async fn query_paused(&self, entry: &TrackedApplication) -> Option<bool> {
        if !entry.is_resolved() {
            return None;
        }
        match self.control.is_paused(entry.pid).await {
            Ok(paused) => {
                self.with_same_entry(entry, |app| app.is_paused = paused).await;
                Some(paused)
            }
            Err(e) => {
                warn!(app_id = %entry.app_id, pid = entry.pid, error = %e, "pause state query failed");
                None
            }
        }
    }

    /// Pause or resume `entry` and record the new state.
    ///
    /// `Some(true)` when the backend acted, `Some(false)` when it declined,
    /// `None` when the call failed.
    pub(crate) async fn apply_pause(&self, entry: &TrackedApplication, paused: bool) -> Option<bool> {
        let result = if paused {
            self.control.pause(entry.pid).await
        } else {
            self.control.resume(entry.pid).await
        };
        match result {
            Ok(true) => {
                self.with_same_entry(entry, |app| app.is_paused = paused).await;
                debug!(app_id = %entry.app_id, pid = entry.pid, paused, "pause state applied");
                Some(true)
            }
            Ok(false) => Some(false),
            Err(e) => {
                warn!(app_id = %entry.app_id, pid = entry.pid, paused, error = %e, "pause call failed");
                None
            }
        }
    }

    /// Drop the entry. Its sticky flag goes with it.
    pub async fn remove(&self, app_id: &AppId) -> Option<TrackedApplication> {
        let mut apps = self.apps.lock().await;
        let index = apps.iter().position(|app| app.app_id.matches(app_id))?;
        let removed = apps.remove(index);
        info!(app_id = %removed.app_id, pid = removed.pid, "stopped tracking application");
        Some(removed)
    }

    /// Remove every entry the process list no longer reports.
    pub async fn reconcile_with_process_list(
        &self,
        current: &[RunningApp],
    ) -> Vec<TrackedApplication> {
        let mut apps = self.apps.lock().await;
        let (kept, removed): (Vec<_>, Vec<_>) = apps
            .drain(..)
            .partition(|app| current.iter().any(|running| app.is_same_app(running)));
        *apps = kept;
        for app in &removed {
            info!(app_id = %app.app_id, pid = app.pid, "application no longer running");
        }
        removed
    }

    /// Reconcile with the process list, then make sure every running
    /// application is tracked. This is the "every tracked entry" view the
    /// reconciliation engines iterate.
    pub async fn sync_with_process_list(&self) -> SyncOutcome {
        let current = self.process_list.running_apps();
        let removed = self.reconcile_with_process_list(&current).await;

        let results = join_all(current.iter().map(|app| self.get_or_create_from(app))).await;
        let mut outcome = SyncOutcome {
            removed,
            ..Default::default()
        };
        for (app, created) in results {
            if created {
                outcome.created += 1;
            }
            if !outcome
                .apps
                .iter()
                .any(|seen| seen.app_id == app.app_id && seen.legacy_game_id == app.legacy_game_id)
            {
                outcome.apps.push(app);
            }
        }
        outcome
    }
}

/// Fill in identity and display data the entry is missing.
fn adopt_metadata(app: &mut TrackedApplication, running: &RunningApp) {
    if !app.app_id.is_known() && running.app_id.is_known() {
        app.app_id = running.app_id.clone();
    }
    if !app.legacy_game_id.is_known() && running.legacy_game_id.is_known() {
        app.legacy_game_id = running.legacy_game_id.clone();
    }
    if app.display_name.is_none() {
        app.display_name = running.display_name.clone();
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("control", &"ProcessControlRef")
            .field("process_list", &"ProcessListRef")
            .finish_non_exhaustive()
    }
}
