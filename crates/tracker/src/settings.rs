//! Live settings, backed by the settings store.
//!
//! Nothing is cached: every decision reads the store, so a write made by
//! another process is seen on the next event.

use crate::error::Result;
use pausegames_storage::{load_or_default, Settings, SettingsStoreRef};
use tracing::info;

pub struct SettingsHandle {
    store: SettingsStoreRef,
}

impl SettingsHandle {
    /// Wrap `store`, logging what it holds at startup.
    pub fn load(store: SettingsStoreRef) -> Self {
        let initial = load_or_default(store.as_ref());
        info!(?initial, "settings loaded");
        Self { store }
    }

    /// Settings as of now. Storage failures fall back to defaults.
    pub fn current(&self) -> Settings {
        load_or_default(self.store.as_ref())
    }

    /// Persist `settings`. Returns the value stored before the write.
    pub fn replace(&self, settings: Settings) -> Result<Settings> {
        let previous = self.current();
        self.store.save(&settings)?;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pausegames_storage::{Database, SettingsStore};
    use std::sync::Arc;

    #[test]
    fn test_replace_persists() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let handle = SettingsHandle::load(db.clone());
        assert_eq!(handle.current(), Settings::default());

        let next = Settings {
            auto_pause: true,
            ..Default::default()
        };
        let previous = handle.replace(next).unwrap();
        assert_eq!(previous, Settings::default());
        assert_eq!(handle.current(), next);
        assert_eq!(db.load().unwrap(), next);
    }

    #[test]
    fn test_sees_writes_made_behind_its_back() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let handle = SettingsHandle::load(db.clone());
        assert!(!handle.current().auto_pause);

        db.save(&Settings {
            auto_pause: true,
            ..Default::default()
        })
        .unwrap();
        assert!(handle.current().auto_pause);
    }
}
