//! Outgoing event seam.
//!
//! The tracker pushes `tracker:*` events through [`EventBus`]. The daemon
//! writes them to stdout as JSON lines; tests capture them in memory.

use std::sync::{Arc, Mutex, MutexGuard};

/// Sink for tracker events. Emission is fire-and-forget.
pub trait EventBus: Send + Sync {
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

pub type EventBusRef = Arc<dyn EventBus>;

/// Records every `(topic, payload)` pair in emission order.
#[derive(Default)]
pub struct InMemoryEventBus {
    emitted: Mutex<Vec<(String, serde_json::Value)>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads emitted on `topic`, oldest first.
    pub fn events_for(&self, topic: &str) -> Vec<serde_json::Value> {
        self.emitted()
            .iter()
            .filter(|(emitted, _)| emitted == topic)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn last_for(&self, topic: &str) -> Option<serde_json::Value> {
        self.emitted()
            .iter()
            .rev()
            .find(|(emitted, _)| emitted == topic)
            .map(|(_, payload)| payload.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.emitted().is_empty()
    }

    fn emitted(&self) -> MutexGuard<'_, Vec<(String, serde_json::Value)>> {
        self.emitted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.emitted().push((topic.to_string(), payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_captures_by_topic() {
        let bus = InMemoryEventBus::new();
        assert!(bus.is_empty());

        bus.emit("tracker:apps_changed", json!({"apps": []}));
        bus.emit("tracker:settings_changed", json!({"autoPause": true}));
        bus.emit("tracker:apps_changed", json!({"apps": [1]}));

        assert_eq!(bus.events_for("tracker:apps_changed").len(), 2);
        assert_eq!(bus.events_for("tracker:settings_changed").len(), 1);
        assert!(bus.events_for("tracker:missing").is_empty());
        assert_eq!(bus.last_for("tracker:apps_changed"), Some(json!({"apps": [1]})));
        assert_eq!(bus.last_for("tracker:missing"), None);
    }
}
