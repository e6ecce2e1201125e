// Error taxonomy of the app.
// Everything here is recoverable: callers log it, show it, and carry on.
use thiserror::Error;

/// Failure talking to the persistent key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to serialize task list: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why the task list came up empty at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read stored tasks: {0}")]
    Read(#[source] StorageError),
    #[error("stored tasks are corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

/// Failure of a platform capability (location, camera).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// The camera was opened without a camera permission grant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no camera permission")]
pub struct CaptureDenied;
