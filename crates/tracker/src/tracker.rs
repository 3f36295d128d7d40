//! The tracker facade and its notification loops.

use crate::correlator::{LifecycleCorrelator, LifetimeOutcome};
use crate::focus::{FocusOutcome, FocusReconciler};
use crate::launch::LaunchCompletion;
use crate::notify::Notifier;
use crate::policy::{FOCUS_THROTTLE_WINDOW, RESOLVE_RETRY, STOP_GRACE_DELAY};
use crate::process_list::ProcessListRef;
use crate::registry::Registry;
use crate::retry::RetryPolicy;
use crate::settings::SettingsHandle;
use crate::subscription::Disposer;
use crate::suspend::{ResumeOutcome, SuspendBracket, SuspendOutcome};
use crate::throttle::{recv_latest, TrailingThrottle};
use pausegames_control::ProcessControlRef;
use pausegames_events::{
    ChangeReason, EventBusRef, FocusChangeEvent, LaunchProgress, LifetimeNotification,
    NotificationHub, SystemSignal,
};
use pausegames_storage::SettingsStoreRef;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Timing knobs. Defaults come from [`crate::policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub resolve_retry: RetryPolicy,
    pub focus_window: Duration,
    pub stop_grace: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            resolve_retry: RESOLVE_RETRY,
            focus_window: FOCUS_THROTTLE_WINDOW,
            stop_grace: STOP_GRACE_DELAY,
        }
    }
}

pub struct Tracker {
    pub(crate) registry: Arc<Registry>,
    pub(crate) settings: Arc<SettingsHandle>,
    pub(crate) notifier: Notifier,
    correlator: LifecycleCorrelator,
    focus: FocusReconciler,
    launch: LaunchCompletion,
    suspend: SuspendBracket,
    throttle: TrailingThrottle,
    shutdown: CancellationToken,
}

impl Tracker {
    pub fn new(
        control: ProcessControlRef,
        process_list: ProcessListRef,
        store: SettingsStoreRef,
        bus: EventBusRef,
    ) -> Self {
        Self::with_config(control, process_list, store, bus, TrackerConfig::default())
    }

    pub fn with_config(
        control: ProcessControlRef,
        process_list: ProcessListRef,
        store: SettingsStoreRef,
        bus: EventBusRef,
        config: TrackerConfig,
    ) -> Self {
        let registry = Arc::new(Registry::new(control, process_list));
        let settings = Arc::new(SettingsHandle::load(store));
        let notifier = Notifier::new(bus, registry.clone());

        Self {
            correlator: LifecycleCorrelator::new(registry.clone(), notifier.clone(), config.stop_grace),
            focus: FocusReconciler::new(registry.clone(), settings.clone(), notifier.clone()),
            launch: LaunchCompletion::new(registry.clone(), notifier.clone(), config.resolve_retry),
            suspend: SuspendBracket::new(registry.clone(), settings.clone(), notifier.clone()),
            throttle: TrailingThrottle::new(config.focus_window),
            shutdown: CancellationToken::new(),
            registry,
            settings,
            notifier,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    pub fn is_starting_up(&self) -> bool {
        self.focus.is_starting_up()
    }

    pub async fn is_suspended(&self) -> bool {
        self.suspend.is_suspended().await
    }

    pub async fn on_lifetime(&self, event: &LifetimeNotification) -> LifetimeOutcome {
        self.correlator.on_lifetime(event, &self.shutdown).await
    }

    /// Track launch state; a completed launch resolves the new application.
    pub async fn on_launch_progress(&self, event: &LaunchProgress) {
        let complete = event.is_complete();
        self.focus.set_starting_up(!complete);
        if complete {
            let resolved = self.launch.on_launch_completed(&event.app_id).await;
            debug!(app_id = %event.app_id, resolved, "launch completed");
        }
    }

    /// Run one focus decision, bypassing the throttle.
    pub async fn on_focus(&self, event: &FocusChangeEvent) -> FocusOutcome {
        self.focus.on_focus(event).await
    }

    pub async fn on_suspend_request(&self) -> SuspendOutcome {
        self.suspend.on_suspend_request().await
    }

    pub async fn on_resume_from_suspend(&self) -> ResumeOutcome {
        self.suspend.on_resume_from_suspend().await
    }

    pub async fn on_system_signal(&self, signal: SystemSignal) {
        match signal {
            SystemSignal::SuspendRequest => {
                let outcome = self.on_suspend_request().await;
                debug!(?outcome, "suspend request handled");
            }
            SystemSignal::ResumeFromSuspend => {
                let outcome = self.on_resume_from_suspend().await;
                debug!(?outcome, "resume handled");
            }
        }
    }

    /// Subscribe to every notification stream, push the initial view and
    /// start handling notifications.
    pub async fn mount(self: &Arc<Self>, hub: &NotificationHub) -> Disposer {
        let token = self.shutdown.child_token();
        let mut disposer = Disposer::new(token.clone());

        let mut lifetime = hub.subscribe_lifetime();
        let mut launch = hub.subscribe_launch();
        let mut focus = hub.subscribe_focus();
        let mut system = hub.subscribe_system();

        self.sync_and_push(ChangeReason::Mount).await;

        let tracker = self.clone();
        let cancel = token.clone();
        disposer.push(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = recv_latest(&mut lifetime) => event,
                };
                let Some(event) = event else { break };
                let outcome = tracker.correlator.on_lifetime(&event, &cancel).await;
                debug!(?outcome, "lifetime notification handled");
            }
        }));

        let tracker = self.clone();
        let cancel = token.clone();
        disposer.push(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = recv_latest(&mut launch) => event,
                };
                let Some(event) = event else { break };
                tracker.on_launch_progress(&event).await;
            }
        }));

        let tracker = self.clone();
        let cancel = token.clone();
        disposer.push(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = tracker.throttle.next(&mut focus) => event,
                };
                let Some(event) = event else { break };
                let outcome = tracker.focus.on_focus(&event).await;
                debug!(?outcome, "focus change handled");
            }
        }));

        let tracker = self.clone();
        let cancel = token;
        disposer.push(tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    signal = recv_latest(&mut system) => signal,
                };
                let Some(signal) = signal else { break };
                tracker.on_system_signal(signal).await;
            }
        }));

        info!("tracker mounted");
        disposer
    }

    /// Sync with the process list, refresh every pause state and push.
    pub(crate) async fn sync_and_push(&self, reason: ChangeReason) {
        let apps = self.registry.sync_with_process_list().await.apps;
        futures::future::join_all(apps.iter().map(|app| self.registry.query_paused(app))).await;
        self.notifier.apps_changed(reason).await;
    }

    /// Cancel every mount and pending timer of this tracker.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
