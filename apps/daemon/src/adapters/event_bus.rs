//! JSON-lines event bus adapter.
//!
//! Implements the EventBus trait by writing one `{"topic", "payload"}`
//! object per line.

use pausegames_events::EventBus;
use serde_json::json;
use std::io::Write;
use std::sync::Mutex;

/// EventBus implementation that writes events as JSON lines.
pub struct JsonLinesEventBus<W: Write + Send> {
    out: Mutex<W>,
}

impl JsonLinesEventBus<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesEventBus<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> EventBus for JsonLinesEventBus<W> {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        let line = json!({ "topic": topic, "payload": payload });
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            tracing::warn!(topic, error = %e, "failed to write event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_event() {
        let bus = JsonLinesEventBus::new(Vec::new());
        bus.emit("tracker:apps_changed", json!({"apps": []}));
        bus.emit("tracker:settings_changed", json!({"autoPause": true}));

        let out = String::from_utf8(bus.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["topic"], "tracker:apps_changed");
        assert_eq!(lines[1]["payload"]["autoPause"], true);
    }
}
