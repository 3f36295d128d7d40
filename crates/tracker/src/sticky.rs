//! Sticky overrides.
//!
//! A manual pause or resume while auto-pause is on marks the entry sticky,
//! and focus reconciliation leaves sticky entries alone. The flag lives on
//! the entry, so removing the entry forgets it.

use crate::registry::Registry;
use pausegames_control::AppId;
use tracing::debug;

impl Registry {
    /// Returns `false` if the entry is not tracked.
    pub async fn mark_sticky(&self, app_id: &AppId) -> bool {
        self.set_sticky(app_id, true).await
    }

    pub async fn clear_sticky(&self, app_id: &AppId) -> bool {
        self.set_sticky(app_id, false).await
    }

    /// Returns how many entries were sticky.
    pub async fn clear_all_sticky(&self) -> usize {
        let cleared = self
            .with_apps(|apps| {
                let mut cleared = 0;
                for app in apps.iter_mut().filter(|app| app.sticky) {
                    app.sticky = false;
                    cleared += 1;
                }
                cleared
            })
            .await;
        if cleared > 0 {
            debug!(cleared, "cleared sticky overrides");
        }
        cleared
    }

    pub async fn is_sticky(&self, app_id: &AppId) -> bool {
        self.with_entry(app_id, |app| app.sticky)
            .await
            .unwrap_or(false)
    }

    async fn set_sticky(&self, app_id: &AppId, sticky: bool) -> bool {
        let found = self
            .with_entry(app_id, |app| app.sticky = sticky)
            .await
            .is_some();
        if found {
            debug!(app_id = %app_id, sticky, "sticky override updated");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use crate::app::TrackedApplication;
    use crate::process_list::SharedProcessList;
    use crate::registry::Registry;
    use pausegames_control::{AppId, NullControl};
    use std::sync::Arc;

    async fn registry_with(ids: &[&str]) -> Registry {
        let registry = Registry::new(Arc::new(NullControl), Arc::new(SharedProcessList::new()));
        registry
            .with_apps(|apps| {
                apps.extend(ids.iter().map(|id| TrackedApplication::new(*id)));
            })
            .await;
        registry
    }

    #[tokio::test]
    async fn test_mark_and_clear() {
        let registry = registry_with(&["100"]).await;
        let id = AppId::from("100");

        assert!(!registry.is_sticky(&id).await);
        assert!(registry.mark_sticky(&id).await);
        assert!(registry.is_sticky(&id).await);
        assert!(registry.clear_sticky(&id).await);
        assert!(!registry.is_sticky(&id).await);
    }

    #[tokio::test]
    async fn test_untracked_entry() {
        let registry = registry_with(&[]).await;
        assert!(!registry.mark_sticky(&AppId::from("100")).await);
        assert!(!registry.is_sticky(&AppId::from("100")).await);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let registry = registry_with(&["100", "200", "300"]).await;
        registry.mark_sticky(&AppId::from("100")).await;
        registry.mark_sticky(&AppId::from("300")).await;

        assert_eq!(registry.clear_all_sticky().await, 2);
        assert_eq!(registry.clear_all_sticky().await, 0);
    }
}
