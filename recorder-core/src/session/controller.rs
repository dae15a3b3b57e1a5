use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::state::{SessionSnapshot, SessionState, ShutdownDecision, StopReason};
use crate::traits::recorder_delegate::RecorderDelegate;
use crate::traits::recording_worker::{DirectoryProbe, FsDirectoryProbe, RecordingWorker, WorkerFlags};

/// Upper bound on how long the timer thread sleeps between stop checks.
const TIMER_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Session lifecycle notification, consumed by the console journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Started { session_id: Uuid },
    StopScheduled { session_id: Uuid },
    Stopped {
        session_id: Uuid,
        reason: StopReason,
        elapsed_secs: u64,
    },
}

/// Callback invoked after each session transition, outside the state lock.
pub type SessionEventCallback = Arc<dyn Fn(&SessionEvent) + Send + Sync + 'static>;

/// Mutable session state, protected by `parking_lot::Mutex`.
///
/// Flags and the timer switch are replaced on every start, so a worker or
/// timer thread left over from a previous session can never touch the
/// current one.
struct SessionInner {
    state: SessionState,
    elapsed_secs: u64,
    session_id: Option<Uuid>,
    flags: Arc<WorkerFlags>,
    timer_running: Arc<AtomicBool>,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            elapsed_secs: 0,
            session_id: None,
            flags: Arc::new(WorkerFlags::new()),
            timer_running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            elapsed_secs: self.elapsed_secs,
            worker_ready: self.flags.is_ready(),
            worker_running: self.flags.is_running(),
            session_id: self.session_id,
        }
    }

    /// Immediate stop: cancel the worker, stop the timer, reset to idle.
    fn finish(&mut self, reason: StopReason) -> SessionEvent {
        self.flags.set_running(false);
        self.flags.set_stop_when_ready(false);
        self.timer_running.store(false, Ordering::SeqCst);

        let event = SessionEvent::Stopped {
            session_id: self.session_id.unwrap_or_default(),
            reason,
            elapsed_secs: self.elapsed_secs,
        };
        self.state = SessionState::Idle;
        self.elapsed_secs = 0;
        self.session_id = None;
        event
    }
}

/// Clears `running` when the worker thread leaves `run`, however it leaves.
///
/// A failed or panicking worker also loses `ready`, which is how the next
/// tick tells a crash from a clean exit at a track boundary.
struct RunningGuard {
    flags: Arc<WorkerFlags>,
    failed: bool,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if self.failed || thread::panicking() {
            self.flags.set_ready(false);
        }
        self.flags.set_running(false);
    }
}

/// Recording session orchestrator.
///
/// Owns the `Idle → Recording → StopPending → Idle` state machine, the
/// worker thread and the elapsed-time timer:
/// ```text
/// start() ──spawn──→ [recording-worker]  run(&flags)
///    └─────spawn──→ [session-timer]     tick every interval
/// request_stop() / on_timer_tick() / confirm_shutdown() → Idle
/// ```
/// All transitions run under one lock, so ticks and user commands never
/// interleave inside a transition. Delegate and event callbacks fire after
/// the lock is released.
pub struct SessionController {
    worker: Arc<dyn RecordingWorker>,
    probe: Arc<dyn DirectoryProbe>,
    output_directory: PathBuf,
    tick_interval: Duration,
    session: Arc<Mutex<SessionInner>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    events: Option<SessionEventCallback>,
    worker_handles: Vec<thread::JoinHandle<()>>,
    timer_handle: Option<thread::JoinHandle<()>>,
}

impl SessionController {
    pub fn new(config: &RecorderConfiguration, worker: Arc<dyn RecordingWorker>) -> Self {
        Self {
            worker,
            probe: Arc::new(FsDirectoryProbe),
            output_directory: config.output_directory.clone(),
            tick_interval: config.tick_interval,
            session: Arc::new(Mutex::new(SessionInner::new())),
            delegate: None,
            events: None,
            worker_handles: Vec::new(),
            timer_handle: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn set_event_callback(&mut self, callback: SessionEventCallback) {
        self.events = Some(callback);
    }

    pub fn set_directory_probe(&mut self, probe: Arc<dyn DirectoryProbe>) {
        self.probe = probe;
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Change the output directory. Refused while a session is live,
    /// because settings surfaces are locked then.
    pub fn set_output_directory(&mut self, path: impl Into<PathBuf>) -> bool {
        if self.state().is_active() {
            return false;
        }
        self.output_directory = path.into();
        true
    }

    pub fn state(&self) -> SessionState {
        self.session.lock().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().snapshot()
    }

    /// Start a session. Transitions: idle → recording.
    ///
    /// A no-op when a session is already live.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if self.state().is_active() {
            log::debug!("Start ignored: session already active");
            return Ok(());
        }

        if !self.probe.exists(&self.output_directory) {
            log::warn!("Output directory missing: {}", self.output_directory.display());
            return Err(RecorderError::DirectoryUnavailable(self.output_directory.clone()));
        }

        self.worker_handles.retain(|h| !h.is_finished());

        // A worker that has not begun a track yet is between tracks.
        let flags = Arc::new(WorkerFlags::new());
        flags.set_running(true);
        flags.set_ready(true);
        let timer_running = Arc::new(AtomicBool::new(true));
        let session_id = Uuid::new_v4();

        let worker_handle = self.spawn_worker(Arc::clone(&flags))?;
        self.worker_handles.push(worker_handle);

        if let Err(e) = self.start_timer(Arc::clone(&timer_running)) {
            flags.set_running(false);
            log::error!("Session {} not started: {}", session_id, e);
            return Err(e);
        }

        let snapshot = {
            let mut s = self.session.lock();
            s.state = SessionState::Recording;
            s.elapsed_secs = 0;
            s.session_id = Some(session_id);
            s.flags = Arc::clone(&flags);
            s.timer_running = Arc::clone(&timer_running);
            s.snapshot()
        };

        log::info!("Recording session {} started", session_id);
        self.announce(Some(snapshot), Some(SessionEvent::Started { session_id }));
        Ok(())
    }

    /// Ask the session to stop.
    ///
    /// Mid-track the stop is deferred until the worker reaches the next track
    /// boundary. Between tracks, or when a deferred stop is already pending,
    /// the session stops immediately.
    pub fn request_stop(&mut self) -> SessionState {
        let (snapshot, event) = {
            let mut s = self.session.lock();
            match s.state {
                SessionState::Idle => return SessionState::Idle,
                SessionState::Recording if !s.flags.is_ready() => {
                    s.state = SessionState::StopPending;
                    s.flags.set_stop_when_ready(true);
                    let session_id = s.session_id.unwrap_or_default();
                    log::info!("Session {} will stop after the current track", session_id);
                    (s.snapshot(), SessionEvent::StopScheduled { session_id })
                }
                _ => {
                    let event = s.finish(StopReason::Requested);
                    (s.snapshot(), event)
                }
            }
        };

        let state = snapshot.state;
        self.announce(Some(snapshot), Some(event));
        state
    }

    /// One timer tick. Normally driven by the `session-timer` thread.
    pub fn on_timer_tick(&self) {
        Self::tick_inner(&self.session, None, self.delegate.as_ref(), self.events.as_ref());
    }

    /// Whether the process may exit right now.
    pub fn on_shutdown_requested(&self) -> ShutdownDecision {
        if self.state().is_idle() {
            ShutdownDecision::Allow
        } else {
            ShutdownDecision::ConfirmationRequired
        }
    }

    /// Force-stop any live session and release every worker and timer thread.
    ///
    /// Blocks until the workers have returned, so their resources are
    /// released when this returns. Idempotent.
    pub fn confirm_shutdown(&mut self) {
        let event = {
            let mut s = self.session.lock();
            s.state.is_active().then(|| s.finish(StopReason::Shutdown))
        };
        if let Some(event) = event {
            log::warn!("Forcing recording session to stop for shutdown");
            self.announce(Some(self.snapshot()), Some(event));
        }

        for handle in self.worker_handles.drain(..) {
            if handle.join().is_err() {
                log::error!("Recording worker panicked during shutdown");
            }
        }
        if let Some(handle) = self.timer_handle.take() {
            if handle.join().is_err() {
                log::error!("Session timer panicked");
            }
        }
    }

    // --- Internal helpers ---

    fn spawn_worker(&self, flags: Arc<WorkerFlags>) -> Result<thread::JoinHandle<()>, RecorderError> {
        let worker = Arc::clone(&self.worker);
        let spawned = Arc::clone(&flags);

        thread::Builder::new()
            .name("recording-worker".into())
            .spawn(move || {
                let mut guard = RunningGuard {
                    flags: spawned,
                    failed: false,
                };
                if let Err(e) = worker.run(&guard.flags) {
                    log::error!("Recording worker error: {}", e);
                    guard.failed = true;
                }
            })
            .map_err(|e| {
                flags.set_running(false);
                RecorderError::WorkerFailed(format!("failed to spawn worker thread: {}", e))
            })
    }

    fn start_timer(&mut self, running: Arc<AtomicBool>) -> Result<(), RecorderError> {
        let session = Arc::clone(&self.session);
        let delegate = self.delegate.clone();
        let events = self.events.clone();
        let interval = self.tick_interval;

        let handle = thread::Builder::new()
            .name("session-timer".into())
            .spawn(move || {
                let mut next_tick = Instant::now() + interval;
                while running.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    if now >= next_tick {
                        next_tick += interval;
                        Self::tick_inner(&session, Some(&running), delegate.as_ref(), events.as_ref());
                    } else {
                        thread::sleep((next_tick - now).min(TIMER_POLL_INTERVAL));
                    }
                }
            })
            .map_err(|e| RecorderError::WorkerFailed(format!("failed to spawn timer thread: {}", e)))?;

        // The previous timer has already been told to stop; let it exit on its own.
        self.timer_handle = Some(handle);
        Ok(())
    }

    /// `timer` identifies the calling timer thread; ticks from a thread that
    /// belongs to an earlier session are dropped.
    fn tick_inner(
        session: &Mutex<SessionInner>,
        timer: Option<&Arc<AtomicBool>>,
        delegate: Option<&Arc<dyn RecorderDelegate>>,
        events: Option<&SessionEventCallback>,
    ) {
        let (snapshot, event) = {
            let mut s = session.lock();
            if s.state.is_idle() || timer.is_some_and(|t| !Arc::ptr_eq(t, &s.timer_running)) {
                return;
            }
            s.elapsed_secs += 1;

            let running = s.flags.is_running();
            let ready = s.flags.is_ready();
            let reason = match (running, ready) {
                (_, true) if s.state.is_stop_pending() => Some(StopReason::Acknowledged),
                (true, _) => None,
                (false, false) => Some(StopReason::WorkerCrashed),
                (false, true) => Some(StopReason::WorkerFinished),
            };

            let event = reason.map(|reason| s.finish(reason));
            (s.snapshot(), event)
        };

        if let Some(SessionEvent::Stopped { session_id, reason, .. }) = event {
            match reason {
                StopReason::WorkerCrashed => log::warn!("Recording worker {} died mid-track; session stopped", session_id),
                _ => log::info!("Recording session {} finished ({:?})", session_id, reason),
            }
        }

        Self::announce_to(delegate, events, Some(snapshot), event);
    }

    fn announce(&self, snapshot: Option<SessionSnapshot>, event: Option<SessionEvent>) {
        let snapshot = snapshot.or_else(|| Some(self.snapshot()));
        Self::announce_to(self.delegate.as_ref(), self.events.as_ref(), snapshot, event);
    }

    fn announce_to(
        delegate: Option<&Arc<dyn RecorderDelegate>>,
        events: Option<&SessionEventCallback>,
        snapshot: Option<SessionSnapshot>,
        event: Option<SessionEvent>,
    ) {
        if let Some(delegate) = delegate {
            if let Some(ref snapshot) = snapshot {
                delegate.on_session_state_changed(snapshot);
            }
            match event {
                Some(SessionEvent::Started { .. }) => delegate.on_settings_editable(false),
                Some(SessionEvent::Stopped { reason, .. }) => {
                    delegate.on_settings_editable(true);
                    if reason == StopReason::WorkerCrashed {
                        delegate.on_error(&RecorderError::WorkerCrashed);
                    }
                }
                _ => {}
            }
        }

        if let (Some(events), Some(ref event)) = (events, event) {
            events(event);
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.confirm_shutdown();
    }
}
