//! Subscriber pushes.

use crate::registry::Registry;
use pausegames_events::{event_names, AppsChangedEvent, ChangeReason, EventBusRef};
use pausegames_storage::Settings;
use std::sync::Arc;
use tracing::{debug, warn};

/// Emits tracker events on the bus.
#[derive(Clone)]
pub struct Notifier {
    bus: EventBusRef,
    registry: Arc<Registry>,
}

impl Notifier {
    pub fn new(bus: EventBusRef, registry: Arc<Registry>) -> Self {
        Self { bus, registry }
    }

    /// Push the full tracked set.
    pub async fn apps_changed(&self, reason: ChangeReason) {
        let apps = self
            .registry
            .snapshot()
            .await
            .iter()
            .map(|app| app.snapshot())
            .collect::<Vec<_>>();
        debug!(?reason, count = apps.len(), "pushing apps_changed");
        self.emit(event_names::APPS_CHANGED, &AppsChangedEvent::new(apps, reason));
    }

    pub fn settings_changed(&self, settings: &Settings) {
        self.emit(event_names::SETTINGS_CHANGED, settings);
    }

    fn emit<T: serde::Serialize>(&self, topic: &str, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(value) => self.bus.emit(topic, value),
            Err(e) => warn!(topic, error = %e, "failed to serialize event"),
        }
    }
}
