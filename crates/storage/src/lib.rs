//! Settings persistence for pause-games.
//!
//! Settings are stored as a single JSON blob under one key of a key-value
//! `settings` table. A missing or unreadable blob yields defaults; only a
//! failure of the storage itself is reported to the caller.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Key of the settings blob.
pub const SETTINGS_KEY: &str = "pause-games-settings";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// User settings. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Pause every application before the system sleeps.
    pub pause_before_suspend: bool,
    /// Pause applications that lose focus, resume the focused one.
    pub auto_pause: bool,
    /// Treat focusing the host overlay as focus loss for every application.
    pub overlay_pause: bool,
}

impl Settings {
    /// Parse a stored blob, falling back to defaults if it is corrupt.
    pub fn from_blob(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(blob).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "corrupt settings blob, using defaults");
            Self::default()
        })
    }
}

/// Key-value storage for [`Settings`].
pub trait SettingsStore: Send + Sync {
    /// Read the settings. Absent or corrupt data yields defaults.
    fn load(&self) -> Result<Settings>;

    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Shared settings store reference.
pub type SettingsStoreRef = Arc<dyn SettingsStore>;

/// Best-effort read: storage failures are logged and replaced by defaults.
pub fn load_or_default(store: &dyn SettingsStore) -> Settings {
    store.load().unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to load settings, using defaults");
        Settings::default()
    })
}

/// SQLite-backed settings store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Raw value stored under `key`.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let value = conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (key, value),
        )?;
        Ok(())
    }
}

impl SettingsStore for Database {
    fn load(&self) -> Result<Settings> {
        Ok(self
            .get_raw(SETTINGS_KEY)?
            .map(|blob| Settings::from_blob(&blob))
            .unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.set_raw(SETTINGS_KEY, &json)
    }
}

/// Settings held in memory, as a raw blob like the database keeps them.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    blob: Mutex<Option<String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new();
        // Serializing three booleans cannot fail.
        let _ = store.save(&settings);
        store
    }

    /// Overwrite the stored blob verbatim.
    pub fn set_blob(&self, blob: impl Into<String>) {
        *self.blob.lock().expect("settings mutex poisoned") = Some(blob.into());
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings> {
        let blob = self.blob.lock().expect("settings mutex poisoned");
        Ok(blob
            .as_deref()
            .map(Settings::from_blob)
            .unwrap_or_default())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        *self.blob.lock().expect("settings mutex poisoned") = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_use_camel_case_keys() {
        let settings = Settings {
            pause_before_suspend: true,
            auto_pause: false,
            overlay_pause: true,
        };
        let value = serde_json::to_value(settings).unwrap();
        assert_eq!(value["pauseBeforeSuspend"], true);
        assert_eq!(value["autoPause"], false);
        assert_eq!(value["overlayPause"], true);
    }

    #[test]
    fn test_partial_blob_fills_defaults() {
        let settings = Settings::from_blob(r#"{"autoPause": true}"#);
        assert!(settings.auto_pause);
        assert!(!settings.pause_before_suspend);
        assert!(!settings.overlay_pause);
    }

    #[test]
    fn test_corrupt_blob_yields_defaults() {
        assert_eq!(Settings::from_blob("{not json"), Settings::default());
        assert_eq!(Settings::from_blob(""), Settings::default());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load().unwrap(), Settings::default());

        let settings = Settings {
            auto_pause: true,
            ..Default::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);

        store.set_blob("garbage");
        assert_eq!(load_or_default(&store), Settings::default());
    }
}
