//! Notification hub the host publishes into.
//!
//! One broadcast channel per notification stream, so several independent
//! handlers can subscribe to the same stream. Publishing never blocks; a
//! subscriber that falls behind loses the oldest notifications, which the
//! tracker tolerates.

use crate::{FocusChangeEvent, LaunchProgress, LifetimeNotification, SystemSignal};
use tokio::sync::broadcast;

/// Default per-stream buffer size.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct NotificationHub {
    lifetime: broadcast::Sender<LifetimeNotification>,
    launch: broadcast::Sender<LaunchProgress>,
    focus: broadcast::Sender<FocusChangeEvent>,
    system: broadcast::Sender<SystemSignal>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lifetime: broadcast::channel(capacity).0,
            launch: broadcast::channel(capacity).0,
            focus: broadcast::channel(capacity).0,
            system: broadcast::channel(capacity).0,
        }
    }

    /// Publish a lifetime notification. Returns the number of receivers.
    pub fn publish_lifetime(&self, event: LifetimeNotification) -> usize {
        self.lifetime.send(event).unwrap_or(0)
    }

    pub fn publish_launch(&self, event: LaunchProgress) -> usize {
        self.launch.send(event).unwrap_or(0)
    }

    pub fn publish_focus(&self, event: FocusChangeEvent) -> usize {
        self.focus.send(event).unwrap_or(0)
    }

    pub fn publish_system(&self, signal: SystemSignal) -> usize {
        self.system.send(signal).unwrap_or(0)
    }

    pub fn subscribe_lifetime(&self) -> broadcast::Receiver<LifetimeNotification> {
        self.lifetime.subscribe()
    }

    pub fn subscribe_launch(&self) -> broadcast::Receiver<LaunchProgress> {
        self.launch.subscribe()
    }

    pub fn subscribe_focus(&self) -> broadcast::Receiver<FocusChangeEvent> {
        self.focus.subscribe()
    }

    pub fn subscribe_system(&self) -> broadcast::Receiver<SystemSignal> {
        self.system.subscribe()
    }
}
