use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the recorder core.
///
/// Only `DirectoryUnavailable` aborts the command that produced it. Every
/// other variant is resolved inside the owning component and reported
/// through the delegate or the console journal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("output directory not found: {}", .0.display())]
    DirectoryUnavailable(PathBuf),

    #[error("recording worker stopped unexpectedly")]
    WorkerCrashed,

    #[error("recording worker failed: {0}")]
    WorkerFailed(String),

    #[error("failed to persist settings: {0}")]
    PersistenceWriteFailed(String),

    #[error("failed to load settings: {0}")]
    PersistenceReadFailed(String),

    #[error("audio device not available")]
    DeviceUnavailable,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}
