//! Suspend and resume bracket.
//!
//! Before the system sleeps every running application is paused and its
//! previous state remembered. On wake only the applications this bracket
//! paused are resumed; anything the user had paused stays paused.

use crate::app::TrackedApplication;
use crate::notify::Notifier;
use crate::registry::Registry;
use crate::settings::SettingsHandle;
use futures::future::join_all;
use pausegames_control::{AppId, Pid};
use pausegames_events::ChangeReason;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Pause state of one entry when the bracket opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspendRecord {
    pub app_id: AppId,
    pub pid: Pid,
    pub was_paused: bool,
}

impl SuspendRecord {
    fn is_for(&self, app: &TrackedApplication) -> bool {
        self.pid == app.pid && self.app_id == app.app_id
    }
}

#[derive(Debug, Default)]
enum BracketState {
    #[default]
    Idle,
    Suspended { snapshot: Vec<SuspendRecord> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspendOutcome {
    /// pauseBeforeSuspend is off.
    Disabled,
    /// `recorded` counts every snapshot record, including ones kept from an
    /// earlier request whose resume never arrived.
    Suspended { recorded: usize, paused: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// No bracket was open, or it recorded nothing.
    NothingToResume,
    Resumed { resumed: usize },
}

pub struct SuspendBracket {
    registry: Arc<Registry>,
    settings: Arc<SettingsHandle>,
    notifier: Notifier,
    state: Mutex<BracketState>,
}

impl SuspendBracket {
    pub fn new(registry: Arc<Registry>, settings: Arc<SettingsHandle>, notifier: Notifier) -> Self {
        Self {
            registry,
            settings,
            notifier,
            state: Mutex::new(BracketState::Idle),
        }
    }

    pub async fn is_suspended(&self) -> bool {
        matches!(*self.state.lock().await, BracketState::Suspended { .. })
    }

    /// Pause everything and remember what was already paused.
    ///
    /// A request while the bracket is already open extends it. Entries still
    /// paused keep their earlier record; entries running again are paused and
    /// recorded afresh.
    pub async fn on_suspend_request(&self) -> SuspendOutcome {
        let mut state = self.state.lock().await;
        if !self.settings.current().pause_before_suspend {
            return SuspendOutcome::Disabled;
        }
        let mut snapshot = match std::mem::take(&mut *state) {
            BracketState::Suspended { snapshot } => {
                debug!(kept = snapshot.len(), "suspend request while suspended, extending bracket");
                snapshot
            }
            BracketState::Idle => Vec::new(),
        };

        let apps = self.registry.sync_with_process_list().await.apps;
        let results = join_all(apps.iter().filter(|app| app.is_resolved()).map(|app| {
            let prior = snapshot.iter().find(|record| record.is_for(app)).cloned();
            self.suspend_entry(app, prior)
        }))
        .await;

        let mut paused = 0;
        let mut changed = false;
        for (record, entry_changed, did_pause) in results.into_iter().flatten() {
            changed |= entry_changed;
            paused += usize::from(did_pause);
            match snapshot.iter_mut().find(|kept| kept.pid == record.pid && kept.app_id == record.app_id) {
                Some(kept) => *kept = record,
                None => snapshot.push(record),
            }
        }

        let recorded = snapshot.len();
        info!(recorded, paused, "suspend bracket opened");
        *state = BracketState::Suspended { snapshot };

        if changed {
            self.notifier.apps_changed(ChangeReason::Suspend).await;
        }
        SuspendOutcome::Suspended { recorded, paused }
    }

    /// Returns the record, whether the entry's state moved and whether it
    /// was paused here. `None` if its state could not be read. An entry still
    /// paused inherits `prior`'s state, since this bracket may be the one
    /// that paused it.
    async fn suspend_entry(
        &self,
        app: &TrackedApplication,
        prior: Option<SuspendRecord>,
    ) -> Option<(SuspendRecord, bool, bool)> {
        let observed = self.registry.query_paused(app).await?;
        let was_paused = observed && prior.map_or(true, |prior| prior.was_paused);
        self.registry
            .with_same_entry(app, |entry| entry.last_pause_state_before_suspend = was_paused)
            .await;

        let did_pause = !observed && self.registry.apply_pause(app, true).await == Some(true);
        let record = SuspendRecord {
            app_id: app.app_id.clone(),
            pid: app.pid,
            was_paused,
        };
        Some((record, did_pause || observed != app.is_paused, did_pause))
    }

    /// Resume what the bracket paused and close it.
    pub async fn on_resume_from_suspend(&self) -> ResumeOutcome {
        let mut state = self.state.lock().await;
        let snapshot = match std::mem::take(&mut *state) {
            BracketState::Suspended { snapshot } => snapshot,
            BracketState::Idle => Vec::new(),
        };
        if snapshot.is_empty() {
            return ResumeOutcome::NothingToResume;
        }

        let tracked = self.registry.snapshot().await;
        let members: Vec<(TrackedApplication, bool)> = snapshot
            .iter()
            .filter_map(|record| {
                tracked
                    .iter()
                    .find(|app| record.is_for(app))
                    .map(|app| (app.clone(), record.was_paused))
            })
            .collect();

        let results = join_all(
            members
                .iter()
                .map(|(app, was_paused)| self.resume_entry(app, *was_paused)),
        )
        .await;

        let resumed = results.iter().filter(|(did_resume, _)| *did_resume).count();
        let changed = results.iter().any(|(_, changed)| *changed);
        info!(resumed, "suspend bracket closed");
        drop(state);

        if changed {
            self.notifier.apps_changed(ChangeReason::Resume).await;
        }
        ResumeOutcome::Resumed { resumed }
    }

    async fn resume_entry(&self, app: &TrackedApplication, was_paused: bool) -> (bool, bool) {
        let paused = self.registry.query_paused(app).await;
        let did_resume = match paused {
            Some(true) if !was_paused => self.registry.apply_pause(app, false).await == Some(true),
            _ => false,
        };
        self.registry
            .with_same_entry(app, |entry| entry.last_pause_state_before_suspend = false)
            .await;
        let changed = did_resume || paused.is_some_and(|paused| paused != app.is_paused);
        (did_resume, changed)
    }
}
