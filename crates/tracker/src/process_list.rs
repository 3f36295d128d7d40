//! The host's list of running applications.
//!
//! This list is the sole authority on which applications exist. The
//! registry creates entries from it and destroys entries missing from it.

use pausegames_events::RunningApp;
use std::sync::{Arc, RwLock};

/// Source of the currently running applications.
pub trait ProcessList: Send + Sync {
    fn running_apps(&self) -> Vec<RunningApp>;
}

pub type ProcessListRef = Arc<dyn ProcessList>;

/// Process list the host replaces wholesale whenever it changes.
#[derive(Debug, Default)]
pub struct SharedProcessList {
    apps: RwLock<Vec<RunningApp>>,
}

impl SharedProcessList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apps(apps: Vec<RunningApp>) -> Self {
        Self {
            apps: RwLock::new(apps),
        }
    }

    pub fn replace(&self, apps: Vec<RunningApp>) {
        if let Ok(mut guard) = self.apps.write() {
            *guard = apps;
        }
    }

    pub fn push(&self, app: RunningApp) {
        if let Ok(mut guard) = self.apps.write() {
            guard.push(app);
        }
    }

    /// Drop every entry for `app_id`.
    pub fn remove(&self, app_id: &str) {
        if let Ok(mut guard) = self.apps.write() {
            guard.retain(|app| app.app_id.as_str() != app_id);
        }
    }
}

impl ProcessList for SharedProcessList {
    fn running_apps(&self) -> Vec<RunningApp> {
        self.apps
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_remove() {
        let list = SharedProcessList::with_apps(vec![RunningApp::new("100")]);
        list.push(RunningApp::new("200"));
        assert_eq!(list.running_apps().len(), 2);

        list.remove("100");
        let apps = list.running_apps();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].app_id.as_str(), "200");

        list.replace(Vec::new());
        assert!(list.running_apps().is_empty());
    }
}
