use pausegames_control::{AppId, BackendError};
use pausegames_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("application {0} is not tracked")]
    NotTracked(AppId),

    #[error("application {0} has no resolved process")]
    Unresolved(AppId),

    #[error("process control error: {0}")]
    Backend(#[from] BackendError),

    #[error("settings error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
