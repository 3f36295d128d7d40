//! Handles for the notification loops a mount spawns.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tears down everything one mount started.
///
/// Cancelling stops the notification loops between decisions and abandons
/// pending stop-grace timers. A decision already running finishes first.
/// Dropping the disposer cancels too, without waiting.
pub struct Disposer {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Disposer {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            token,
            handles: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_disposed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for every loop to exit.
    pub async fn dispose(mut self) {
        self.token.cancel();
        for handle in std::mem::take(&mut self.handles) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "notification loop ended abnormally");
            }
        }
        tracing::debug!("tracker unmounted");
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispose_stops_loops() {
        let token = CancellationToken::new();
        let mut disposer = Disposer::new(token.clone());
        let child = token.clone();
        disposer.push(tokio::spawn(async move { child.cancelled().await }));

        disposer.dispose().await;
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_drop_cancels() {
        let token = CancellationToken::new();
        drop(Disposer::new(token.clone()));
        assert!(token.is_cancelled());
    }
}
