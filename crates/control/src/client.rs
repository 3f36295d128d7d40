//! The process control seam.
//!
//! The tracker never touches processes itself. Every primitive goes through
//! this trait so the engine can be driven by a scripted backend in tests and
//! by the platform implementation in the daemon.

use crate::error::Result;
use crate::ids::{AppId, Pid};
use async_trait::async_trait;
use std::sync::Arc;

/// Asynchronous process control primitives.
///
/// Every call may fail with a [`BackendError`](crate::BackendError). A
/// `false` or `0` result is a valid answer, not a failure.
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Whether the application rooted at `pid` is currently stopped.
    async fn is_paused(&self, pid: Pid) -> Result<bool>;

    /// Stop every process of the application rooted at `pid`.
    async fn pause(&self, pid: Pid) -> Result<bool>;

    /// Continue every process of the application rooted at `pid`.
    async fn resume(&self, pid: Pid) -> Result<bool>;

    /// Ask every process of the application to exit.
    async fn terminate(&self, pid: Pid) -> Result<bool>;

    /// Forcefully kill every process of the application.
    async fn kill(&self, pid: Pid) -> Result<bool>;

    /// Find the reaper pid of an application, `0` if it is not running.
    async fn pid_from_app_id(&self, app_id: &AppId) -> Result<Pid>;

    /// Find the application owning `pid`, unknown if none.
    async fn app_id_from_pid(&self, pid: Pid) -> Result<AppId>;
}

/// Shared handle to a control backend.
pub type ProcessControlRef = Arc<dyn ProcessControl>;

/// Backend that controls nothing. Every lookup comes back unresolved.
#[derive(Debug, Default)]
pub struct NullControl;

#[async_trait]
impl ProcessControl for NullControl {
    async fn is_paused(&self, _pid: Pid) -> Result<bool> {
        Ok(false)
    }

    async fn pause(&self, _pid: Pid) -> Result<bool> {
        Ok(false)
    }

    async fn resume(&self, _pid: Pid) -> Result<bool> {
        Ok(false)
    }

    async fn terminate(&self, _pid: Pid) -> Result<bool> {
        Ok(false)
    }

    async fn kill(&self, _pid: Pid) -> Result<bool> {
        Ok(false)
    }

    async fn pid_from_app_id(&self, _app_id: &AppId) -> Result<Pid> {
        Ok(0)
    }

    async fn app_id_from_pid(&self, _pid: Pid) -> Result<AppId> {
        Ok(AppId::unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_control_resolves_nothing() {
        let control: ProcessControlRef = Arc::new(NullControl);
        assert_eq!(control.pid_from_app_id(&AppId::from("100")).await.unwrap(), 0);
        assert!(!control.app_id_from_pid(4242).await.unwrap().is_known());
        assert!(!control.pause(4242).await.unwrap());
    }
}
