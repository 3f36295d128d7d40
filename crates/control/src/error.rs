//! Error types for the process control client.

use thiserror::Error;

/// A failure of the control call itself.
///
/// A logical `false` or `0` result is not an error: those are valid answers
/// meaning "nothing to do" or "not found".
#[derive(Debug, Error)]
pub enum BackendError {
    /// The call reached the backend but could not be completed.
    #[error("{op} failed: {message}")]
    Call { op: &'static str, message: String },

    /// No backend is available on this platform.
    #[error("process control is not available on this platform")]
    Unavailable,
}

impl BackendError {
    pub fn call(op: &'static str, message: impl Into<String>) -> Self {
        Self::Call {
            op,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
