use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → recording → stop_pending → idle
///            ↓                        ↑
///            └────────────────────────┘  (immediate stop)
/// ```
///
/// `StopPending` is a soft stop: the worker keeps writing until the current
/// track boundary, then acknowledges by clearing its running flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    StopPending,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// True while a worker session is live, pending stop included.
    pub fn is_active(&self) -> bool {
        !self.is_idle()
    }

    pub fn is_stop_pending(&self) -> bool {
        matches!(self, Self::StopPending)
    }
}

/// Why a session went back to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The user stopped while the worker was between tracks, or insisted.
    Requested,
    /// The worker reached a track boundary after a deferred stop.
    Acknowledged,
    /// The worker exited on its own while between tracks.
    WorkerFinished,
    /// The worker vanished mid-track.
    WorkerCrashed,
    /// Shutdown was confirmed while the session was busy.
    Shutdown,
}

/// Immutable view of the session, handed to callers and delegates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub elapsed_secs: u64,
    pub worker_ready: bool,
    pub worker_running: bool,
    pub session_id: Option<Uuid>,
}

impl SessionSnapshot {
    /// Elapsed time formatted as `HH:MM:SS` for the timer label.
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }
}

/// Render a second count as `HH:MM:SS`. Hours keep counting past 99.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Answer to a shutdown request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownDecision {
    /// Nothing is running; the process may exit.
    Allow,
    /// A session is live; the caller must ask the user before forcing it.
    ConfirmationRequired,
}
