//! Process control client for pause-games.
//!
//! Wraps the primitives the tracker needs (query paused, pause, resume,
//! terminate, kill and the two identifier lookups) behind an async trait.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  client.rs   - ProcessControl trait + Null   │
//! │  ids.rs      - Pid, AppId, GameId            │
//! └──────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │  platform/linux.rs - sysinfo + signals       │
//! └──────────────────────────────────────────────┘
//! ```

mod client;
mod error;
mod ids;

pub mod platform;

pub use client::{NullControl, ProcessControl, ProcessControlRef};
pub use error::{BackendError, Result};
pub use ids::{AppId, ExternalId, GameId, Pid};
