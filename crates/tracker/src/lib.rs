//! Application tracking and pause-state reconciliation.
//!
//! Keeps a registry of running applications, each identified by the pid of
//! its reaper process, and drives their pause state from host notifications:
//!
//! ```text
//! NotificationHub ──► lifetime ──► LifecycleCorrelator ─┐
//!                 ├─► launch ────► LaunchCompletion ────┤
//!                 ├─► focus ─(throttle)─► FocusReconciler ─┼─► Registry ──► ProcessControl
//!                 └─► system ────► SuspendBracket ──────┘        │
//!                                                               ▼
//!                                                    EventBus (tracker:apps_changed)
//! ```
//!
//! The host's process list decides which applications exist. Notifications
//! only fill in identity and trigger reconciliation.

mod actions;
mod app;
mod correlator;
mod error;
mod focus;
mod launch;
mod notify;
pub mod policy;
mod process_list;
mod registry;
mod retry;
mod settings;
mod sticky;
mod subscription;
mod suspend;
pub mod testing;
mod throttle;
mod tracker;

pub use actions::ToggleOutcome;
pub use app::TrackedApplication;
pub use correlator::{find_match, LifetimeOutcome};
pub use error::{Result, TrackerError};
pub use focus::FocusOutcome;
pub use process_list::{ProcessList, ProcessListRef, SharedProcessList};
pub use registry::{Registry, SyncOutcome};
pub use retry::RetryPolicy;
pub use settings::SettingsHandle;
pub use subscription::Disposer;
pub use suspend::{ResumeOutcome, SuspendOutcome, SuspendRecord};
pub use throttle::TrailingThrottle;
pub use tracker::{Tracker, TrackerConfig};
