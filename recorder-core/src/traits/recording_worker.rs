use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::error::RecorderError;

/// Flags shared between the session controller and its worker.
///
/// - `running`: the session is live. Cleared by the controller to cancel the
///   worker, and by the worker thread when `run` returns.
/// - `ready`: the worker is between tracks. Set by the controller before the
///   worker starts; the worker clears it when it opens a track.
/// - `stop_when_ready`: a deferred stop is pending; the worker returns at the
///   next track boundary.
#[derive(Debug, Default)]
pub struct WorkerFlags {
    running: AtomicBool,
    ready: AtomicBool,
    stop_when_ready: AtomicBool,
}

impl WorkerFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Set by the worker when it enters or leaves a track.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn stop_when_ready(&self) -> bool {
        self.stop_when_ready.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn set_stop_when_ready(&self, pending: bool) {
        self.stop_when_ready.store(pending, Ordering::SeqCst);
    }
}

/// Background worker that captures audio and writes track files.
///
/// The controller calls `run` on a dedicated thread and never waits for it
/// except during forced shutdown. Implementations must:
/// - poll `flags.is_running()` and return promptly once it is false;
/// - keep `flags.set_ready` accurate around each track;
/// - return at the next track boundary when `flags.stop_when_ready()` is set;
/// - own their file and audio handles through RAII so every return path
///   releases them.
pub trait RecordingWorker: Send + Sync + 'static {
    fn run(&self, flags: &WorkerFlags) -> Result<(), RecorderError>;
}

/// Existence check consulted before a session starts.
pub trait DirectoryProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// `DirectoryProbe` backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryProbe;

impl DirectoryProbe for FsDirectoryProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
