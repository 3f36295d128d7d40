//! Adapters that connect the tracker to the daemon's stdio.

mod event_bus;

pub use event_bus::JsonLinesEventBus;
