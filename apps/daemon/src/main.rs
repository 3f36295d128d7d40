//! pause-games daemon.
//!
//! Reads host notifications and user commands as JSON lines on stdin and
//! writes tracker events as JSON lines on stdout. Logs go to stderr.

mod adapters;
mod bridge;
mod protocol;

use adapters::JsonLinesEventBus;
use anyhow::Context;
use bridge::Bridge;
use pausegames_control::platform::PlatformControl;
use pausegames_events::NotificationHub;
use pausegames_storage::Database;
use pausegames_tracker::{SharedProcessList, Tracker};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Overrides the settings database location.
const SETTINGS_DB_ENV: &str = "PAUSEGAMES_SETTINGS_DB";

fn settings_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_DB_ENV) {
        return Ok(PathBuf::from(path));
    }
    let config = dirs::config_dir().context("no config directory for this user")?;
    Ok(config.join("pause-games").join("settings.db"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pausegames=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting pause-games daemon");

    let db_path = settings_path()?;
    let store = Database::open(&db_path)
        .with_context(|| format!("failed to open settings database at {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "settings database opened");

    let processes = Arc::new(SharedProcessList::new());
    let bus = Arc::new(JsonLinesEventBus::stdout());
    let hub = NotificationHub::new();
    let tracker = Arc::new(Tracker::new(
        Arc::new(PlatformControl::default()),
        processes.clone(),
        Arc::new(store),
        bus.clone(),
    ));

    let disposer = tracker.mount(&hub).await;
    let bridge = Bridge::new(tracker.clone(), hub, processes, bus);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) => bridge.handle_line(&line).await,
                None => {
                    tracing::info!("stdin closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    disposer.dispose().await;
    tracing::info!("pause-games daemon stopped");
    Ok(())
}
