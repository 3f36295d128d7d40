//! Platform-specific implementations.

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::SysinfoControl;

// Re-export the appropriate backend for the current platform
#[cfg(target_os = "linux")]
pub type PlatformControl = SysinfoControl;

#[cfg(not(target_os = "linux"))]
pub type PlatformControl = crate::client::NullControl;
