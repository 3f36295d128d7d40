//! Trailing-edge throttle for high-frequency notification streams.
//!
//! A single slot holds the latest event. The first event of a quiet period
//! opens a window; events arriving inside the window replace the slot; when
//! the window closes the slot is handed out. Nothing is queued beyond the
//! slot, so a burst collapses into one decision.

use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, Copy)]
pub struct TrailingThrottle {
    window: Duration,
}

impl TrailingThrottle {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait for the next settled event. `None` once the channel is closed
    /// and the slot is empty.
    ///
    /// Callers process the returned event before asking for the next one,
    /// which keeps decisions from overlapping.
    pub async fn next<T: Clone>(&self, rx: &mut broadcast::Receiver<T>) -> Option<T> {
        let mut slot = recv_latest(rx).await?;
        let deadline = Instant::now() + self.window;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return Some(slot),
                event = recv_latest(rx) => match event {
                    Some(event) => slot = event,
                    None => return Some(slot),
                },
            }
        }
    }
}

/// Receive from a broadcast channel, skipping over lag.
pub(crate) async fn recv_latest<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Option<T> {
    loop {
        match rx.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notification receiver lagged");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_latest() {
        let (tx, mut rx) = broadcast::channel(16);
        let throttle = TrailingThrottle::new(Duration::from_millis(500));

        for n in 1..=5 {
            tx.send(n).unwrap();
        }

        let started = Instant::now();
        assert_eq!(throttle.next(&mut rx).await, Some(5));
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_after_window_start_a_new_window() {
        let (tx, mut rx) = broadcast::channel(16);
        let throttle = TrailingThrottle::new(Duration::from_millis(500));

        let producer = tokio::spawn(async move {
            tx.send(1).unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            tx.send(2).unwrap();
            tokio::time::sleep(Duration::from_millis(600)).await;
            tx.send(3).unwrap();
        });

        assert_eq!(throttle.next(&mut rx).await, Some(2));
        assert_eq!(throttle.next(&mut rx).await, Some(3));
        producer.await.unwrap();
        assert_eq!(throttle.next(&mut rx).await, None);
    }

    #[tokio::test]
    async fn test_closed_channel_returns_none() {
        let (tx, mut rx) = broadcast::channel::<u32>(4);
        drop(tx);
        let throttle = TrailingThrottle::new(Duration::from_millis(10));
        assert_eq!(throttle.next(&mut rx).await, None);
    }
}
