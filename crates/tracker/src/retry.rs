//! Bounded retry with a fixed interval.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Upper bound on the time spent before giving up.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// Run `attempt` until it yields `Some`, sleeping `interval` between
    /// attempts. Returns `None` once every attempt came back empty.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for n in 0..self.max_attempts {
            if n > 0 {
                tokio::time::sleep(self.interval).await;
            }
            if let Some(value) = attempt(n).await {
                return Some(value);
            }
        }
        None
    }
}
