use std::path::PathBuf;
use std::sync::Arc;

use crate::journal::log_journal::LogJournal;
use crate::journal::templates::TemplateCatalog;
use crate::models::audio_models::VolumeUpdate;
use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::log_entry::{LogEntry, MessageKey};
use crate::models::state::{format_elapsed, SessionSnapshot, SessionState, ShutdownDecision, StopReason};
use crate::numbering::order_number::OrderNumberMask;
use crate::session::controller::{SessionController, SessionEvent};
use crate::storage::settings_file::JsonSettingsStore;
use crate::traits::device_gateway::AudioDeviceGateway;
use crate::traits::message_resolver::MessageResolver;
use crate::traits::recorder_delegate::RecorderDelegate;
use crate::traits::recording_worker::{DirectoryProbe, RecordingWorker};
use crate::traits::settings_store::SettingsStore;
use crate::volume::volume_sync::AudioVolumeSync;

/// Recorder front end: one session controller, console journal, order
/// number and volume synchronizer, all reporting to one delegate.
///
/// ```text
/// UI commands → Recorder ─→ SessionController ──events──→ LogJournal
///                        ├→ OrderNumberMask                    │
///                        └→ AudioVolumeSync                    ↓
///                                      └──────────────→ RecorderDelegate
/// ```
///
/// The journal and the order number are shared handles so the recording
/// worker can log tracks and advance the counter from its own thread.
pub struct Recorder {
    config: RecorderConfiguration,
    controller: SessionController,
    journal: Arc<LogJournal>,
    order_number: Arc<OrderNumberMask>,
    volume: AudioVolumeSync,
    delegate: Option<Arc<dyn RecorderDelegate>>,
}

impl Recorder {
    pub fn new(
        config: RecorderConfiguration,
        worker: Arc<dyn RecordingWorker>,
        gateway: Arc<dyn AudioDeviceGateway>,
        resolver: Arc<dyn MessageResolver>,
        store: Arc<dyn SettingsStore>,
        delegate: Option<Arc<dyn RecorderDelegate>>,
    ) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::ConfigurationFailed)?;

        let mut journal = LogJournal::new(resolver, Arc::clone(&store));
        let mut order_number = OrderNumberMask::load(Arc::clone(&store), &config.default_order_mask);
        let mut volume = AudioVolumeSync::load(gateway, store);
        let mut controller = SessionController::new(&config, worker);

        if let Some(ref delegate) = delegate {
            journal.set_delegate(Arc::clone(delegate));
            order_number.set_delegate(Arc::clone(delegate));
            volume.set_delegate(Arc::clone(delegate));
            controller.set_delegate(Arc::clone(delegate));
        }

        let journal = Arc::new(journal);
        let sink = Arc::clone(&journal);
        controller.set_event_callback(Arc::new(move |event: &SessionEvent| {
            Self::journal_event(&sink, event);
        }));

        log::info!("Recorder ready (output: {})", config.output_directory.display());

        Ok(Self {
            config,
            controller,
            journal,
            order_number: Arc::new(order_number),
            volume,
            delegate,
        })
    }

    /// Recorder backed by the JSON settings file named in `config`, with the
    /// English message catalog.
    pub fn open(
        config: RecorderConfiguration,
        worker: Arc<dyn RecordingWorker>,
        gateway: Arc<dyn AudioDeviceGateway>,
        delegate: Option<Arc<dyn RecorderDelegate>>,
    ) -> Result<Self, RecorderError> {
        let store = Arc::new(JsonSettingsStore::open_or_default(config.settings_path.clone()));
        Self::new(config, worker, gateway, Arc::new(TemplateCatalog::english()), store, delegate)
    }

    /// Replay the persisted console and pick the initial audio endpoint.
    pub fn initialize(&mut self) -> Vec<String> {
        let lines = self.journal.replay_history();
        self.refresh_devices();
        self.order_number.announce();
        lines
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    pub fn set_directory_probe(&mut self, probe: Arc<dyn DirectoryProbe>) {
        self.controller.set_directory_probe(probe);
    }

    /// Change the output directory. Refused while recording.
    pub fn set_output_directory(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if !self.controller.set_output_directory(path.clone()) {
            return false;
        }
        self.config.output_directory = path;
        true
    }

    // --- Session ---

    pub fn start(&mut self) -> Result<(), RecorderError> {
        let result = self.controller.start();
        if let Err(RecorderError::DirectoryUnavailable(ref path)) = result {
            let path = path.display().to_string();
            self.journal.append(MessageKey::DirectoryNotFound, &[&path]);
        }
        result
    }

    pub fn request_stop(&mut self) -> SessionState {
        self.controller.request_stop()
    }

    /// The record button: starts when idle, otherwise asks to stop.
    pub fn toggle_recording(&mut self) -> Result<SessionState, RecorderError> {
        if self.controller.state().is_idle() {
            self.start()?;
            Ok(self.controller.state())
        } else {
            Ok(self.request_stop())
        }
    }

    pub fn on_timer_tick(&self) {
        self.controller.on_timer_tick();
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot()
    }

    pub fn on_shutdown_requested(&self) -> ShutdownDecision {
        self.controller.on_shutdown_requested()
    }

    /// Force-stop, join the worker and drop the endpoint selection.
    pub fn confirm_shutdown(&mut self) {
        self.controller.confirm_shutdown();
        self.volume.release();
    }

    // --- Console ---

    /// Shared journal, for the worker to report tracks.
    pub fn journal(&self) -> Arc<LogJournal> {
        Arc::clone(&self.journal)
    }

    pub fn log(&self, key: MessageKey, args: &[&str]) -> Option<LogEntry> {
        self.journal.append(key, args)
    }

    pub fn clear_console(&self) {
        self.journal.clear_console();
    }

    pub fn console_lines(&self) -> Vec<String> {
        self.journal.console_lines()
    }

    // --- Order number ---

    /// Shared counter, for the worker to stamp and advance.
    pub fn order_number(&self) -> Arc<OrderNumberMask> {
        Arc::clone(&self.order_number)
    }

    pub fn formatted_order_number(&self) -> String {
        self.order_number.format()
    }

    pub fn adjust_order_up(&self, modifier_held: bool) -> bool {
        self.order_number.adjust_up(modifier_held)
    }

    pub fn adjust_order_down(&self, modifier_held: bool) -> bool {
        self.order_number.adjust_down(modifier_held)
    }

    pub fn set_order_from_text(&self, text: &str) -> bool {
        self.order_number.set_from_text(text)
    }

    // --- Volume ---

    pub fn volume(&self) -> &AudioVolumeSync {
        &self.volume
    }

    pub fn set_volume(&mut self, percent: u8) -> Result<VolumeUpdate, RecorderError> {
        let had_device = self.has_device();
        let result = self.volume.set_volume(percent);
        self.report_device_loss(had_device);
        result
    }

    pub fn on_device_changed(&mut self, device_id: &str) {
        let had_device = self.has_device();
        self.volume.on_device_changed(device_id);
        self.report_device_loss(had_device);
    }

    pub fn on_device_list_empty(&mut self) {
        let had_device = self.has_device();
        self.volume.on_device_list_empty();
        self.report_device_loss(had_device);
    }

    pub fn refresh_devices(&mut self) {
        let had_device = self.has_device();
        self.volume.refresh_devices();
        self.report_device_loss(had_device);
    }

    // --- Internal helpers ---

    fn has_device(&self) -> bool {
        !self.volume.devices().is_empty()
    }

    fn report_device_loss(&self, had_device: bool) {
        if had_device && !self.has_device() {
            self.journal.append(MessageKey::DeviceUnavailable, &[]);
            if let Some(ref delegate) = self.delegate {
                delegate.on_error(&RecorderError::DeviceUnavailable);
            }
        }
    }

    fn journal_event(journal: &LogJournal, event: &SessionEvent) {
        match *event {
            SessionEvent::Started { .. } => {
                journal.append(MessageKey::SessionStarted, &[]);
            }
            SessionEvent::StopScheduled { .. } => {
                journal.append(MessageKey::StopScheduled, &[]);
            }
            SessionEvent::Stopped { reason, elapsed_secs, .. } => {
                if reason == StopReason::WorkerCrashed {
                    journal.append(MessageKey::WorkerCrashed, &[]);
                }
                journal.append(MessageKey::SessionStopped, &[&format_elapsed(elapsed_secs)]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::DeviceListUpdate;
    use crate::models::log_entry::StyleHint;
    use crate::storage::settings_file::MemorySettingsStore;
    use crate::test_support::{init_logging, wait_until, FakeGateway, RecordingDelegate, ScriptedWorker, WorkerControl};
    use parking_lot::Mutex;
    use std::time::Duration;

    struct Harness {
        recorder: Recorder,
        control: Arc<WorkerControl>,
        gateway: Arc<FakeGateway>,
        store: Arc<MemorySettingsStore>,
        delegate: Arc<RecordingDelegate>,
    }

    fn config() -> RecorderConfiguration {
        RecorderConfiguration {
            output_directory: std::env::temp_dir(),
            tick_interval: Duration::from_secs(10),
            ..Default::default()
        }
    }

    fn harness() -> Harness {
        init_logging();
        let (worker, control) = ScriptedWorker::new();
        let gateway = Arc::new(FakeGateway::with_devices(&["A", "B"]));
        let store = Arc::new(MemorySettingsStore::new());
        let delegate = Arc::new(RecordingDelegate::default());
        let recorder = Recorder::new(
            config(),
            worker,
            gateway.clone(),
            Arc::new(TemplateCatalog::english()),
            store.clone(),
            Some(delegate.clone()),
        )
        .unwrap();
        Harness {
            recorder,
            control,
            gateway,
            store,
            delegate,
        }
    }

    fn console_ends_with(recorder: &Recorder, suffix: &str) -> bool {
        recorder.console_lines().last().is_some_and(|l| l.ends_with(suffix))
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (worker, _control) = ScriptedWorker::new();
        let config = RecorderConfiguration {
            default_order_mask: "0000000".into(),
            ..config()
        };
        let result = Recorder::new(
            config,
            worker,
            Arc::new(FakeGateway::default()),
            Arc::new(TemplateCatalog::english()),
            Arc::new(MemorySettingsStore::new()),
            None,
        );
        assert!(matches!(result, Err(RecorderError::ConfigurationFailed(_))));
    }

    #[test]
    fn missing_directory_is_logged() {
        let mut h = harness();
        assert!(h.recorder.set_output_directory("/no/such/recorder/output"));

        let err = h.recorder.start().unwrap_err();

        assert!(matches!(err, RecorderError::DirectoryUnavailable(_)));
        assert!(console_ends_with(&h.recorder, "Output folder not found: /no/such/recorder/output"));
        assert_eq!(h.recorder.state(), SessionState::Idle);
    }

    #[test]
    fn session_lifecycle_is_journaled() {
        let mut h = harness();
        h.recorder.start().unwrap();
        assert!(console_ends_with(&h.recorder, "Recording session started"));
        assert!(wait_until(|| h.control.started() == 1));

        h.recorder.on_timer_tick();
        h.recorder.on_timer_tick();
        assert_eq!(h.recorder.request_stop(), SessionState::Idle);

        assert!(console_ends_with(&h.recorder, "Recording session ended after 00:00:02"));
        assert_eq!(h.delegate.editable(), vec![false, true]);
    }

    #[test]
    fn deferred_stop_is_journaled() {
        let mut h = harness();
        h.recorder.toggle_recording().unwrap();
        assert!(wait_until(|| h.control.started() == 1));
        h.control.begin_track();
        assert!(wait_until(|| !h.recorder.snapshot().worker_ready));

        assert_eq!(h.recorder.toggle_recording().unwrap(), SessionState::StopPending);
        assert!(console_ends_with(&h.recorder, "Recording will stop after the current track"));

        h.control.end_track();
        assert!(wait_until(|| !h.recorder.snapshot().worker_running));
        h.recorder.on_timer_tick();
        assert_eq!(h.recorder.state(), SessionState::Idle);
        assert!(console_ends_with(&h.recorder, "Recording session ended after 00:00:01"));
    }

    #[test]
    fn worker_crash_is_journaled() {
        let mut h = harness();
        h.recorder.start().unwrap();
        assert!(wait_until(|| h.control.started() == 1));
        h.control.begin_track();
        assert!(wait_until(|| !h.recorder.snapshot().worker_ready));
        h.control.fail();
        assert!(wait_until(|| !h.recorder.snapshot().worker_running));

        h.recorder.on_timer_tick();

        let lines = h.recorder.console_lines();
        assert!(lines[lines.len() - 2].ends_with("Recorder stopped unexpectedly"));
        assert!(lines[lines.len() - 1].ends_with("Recording session ended after 00:00:01"));
        assert_eq!(h.delegate.errors(), vec![RecorderError::WorkerCrashed]);
    }

    #[test]
    fn order_number_commands_persist() {
        let h = harness();
        assert_eq!(h.recorder.formatted_order_number(), "001");

        assert!(h.recorder.adjust_order_up(false));
        assert!(h.recorder.adjust_order_up(true));
        assert!(!h.recorder.set_order_from_text("abc"));

        assert_eq!(h.recorder.formatted_order_number(), "0002");
        assert_eq!(h.store.load("order_number_mask").unwrap().as_deref(), Some("0000"));
        assert_eq!(h.delegate.order_numbers().last().map(String::as_str), Some("0002"));
    }

    #[test]
    fn worker_handles_share_state() {
        let h = harness();
        let order = h.recorder.order_number();
        let journal = h.recorder.journal();

        std::thread::spawn(move || {
            let number = order.format();
            journal.append(MessageKey::Recorded, &[&number]);
            order.advance_if_enabled();
        })
        .join()
        .unwrap();

        assert_eq!(h.recorder.formatted_order_number(), "002");
        assert!(console_ends_with(&h.recorder, "Recorded: 001"));
    }

    /// Delegate that reads the shared handles back from inside its callbacks,
    /// the way a UI refreshing its widgets would.
    #[derive(Default)]
    struct ReadBackDelegate {
        journal: Mutex<Option<Arc<LogJournal>>>,
        order_number: Mutex<Option<Arc<OrderNumberMask>>>,
        console_seen: Mutex<Vec<usize>>,
        order_seen: Mutex<Vec<String>>,
    }

    impl RecorderDelegate for ReadBackDelegate {
        fn on_session_state_changed(&self, _snapshot: &SessionSnapshot) {}

        fn on_settings_editable(&self, _editable: bool) {}

        fn on_log_appended(&self, _line: &str, _hint: &StyleHint) {
            let journal = self.journal.lock().clone();
            if let Some(journal) = journal {
                self.console_seen.lock().push(journal.console_lines().len());
            }
        }

        fn on_order_number_changed(&self, _formatted: &str) {
            let order_number = self.order_number.lock().clone();
            if let Some(order_number) = order_number {
                self.order_seen.lock().push(order_number.format());
            }
        }

        fn on_volume_changed(&self, _update: &VolumeUpdate) {}

        fn on_device_list_changed(&self, _update: &DeviceListUpdate) {}

        fn on_error(&self, _error: &RecorderError) {}
    }

    #[test]
    fn delegate_can_read_back_from_callbacks() {
        init_logging();
        let (worker, _control) = ScriptedWorker::new();
        let delegate = Arc::new(ReadBackDelegate::default());
        let recorder = Recorder::new(
            config(),
            worker,
            Arc::new(FakeGateway::default()),
            Arc::new(TemplateCatalog::english()),
            Arc::new(MemorySettingsStore::new()),
            Some(delegate.clone()),
        )
        .unwrap();
        *delegate.journal.lock() = Some(recorder.journal());
        *delegate.order_number.lock() = Some(recorder.order_number());

        let journal = recorder.journal();
        std::thread::spawn(move || journal.append(MessageKey::Recorded, &["a"]))
            .join()
            .unwrap();
        recorder.log(MessageKey::Recorded, &["b"]);
        recorder.adjust_order_up(false);

        assert_eq!(*delegate.console_seen.lock(), vec![1, 2]);
        assert_eq!(*delegate.order_seen.lock(), vec!["002".to_string()]);
    }

    #[test]
    fn initialize_replays_and_selects_device() {
        let h = harness();
        h.store.save("logs", ";[08:00:00] Recorded: old").unwrap();
        let (worker, _control) = ScriptedWorker::new();
        let mut recorder = Recorder::new(
            config(),
            worker,
            h.gateway.clone(),
            Arc::new(TemplateCatalog::english()),
            h.store.clone(),
            Some(h.delegate.clone()),
        )
        .unwrap();

        let lines = recorder.initialize();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[08:00:00] Recorded: old");
        assert!(lines[1].ends_with("Previous logs"));
        assert_eq!(recorder.volume().selected_device_id(), Some("A"));
        assert!(h.delegate.device_lists().last().unwrap().selector_enabled);
    }

    #[test]
    fn device_loss_is_reported_once() {
        let mut h = harness();
        h.recorder.refresh_devices();

        h.gateway.set_devices(&[]);
        h.recorder.refresh_devices();
        assert_eq!(h.recorder.set_volume(40), Err(RecorderError::DeviceUnavailable));

        let unavailable = h
            .recorder
            .console_lines()
            .iter()
            .filter(|l| l.ends_with("Audio device not available"))
            .count();
        assert_eq!(unavailable, 1);
        assert_eq!(h.delegate.errors(), vec![RecorderError::DeviceUnavailable]);
    }

    #[test]
    fn volume_flows_through_gateway() {
        let mut h = harness();
        h.recorder.refresh_devices();
        h.recorder.on_device_changed("B");

        let update = h.recorder.set_volume(27).unwrap();

        assert_eq!(update.percent, 28);
        assert_eq!(h.gateway.volume_of("B"), Some(28));
        assert_eq!(h.store.load("audio_endpoint_device_id").unwrap().as_deref(), Some("B"));
    }

    #[test]
    fn confirm_shutdown_releases_everything() {
        let mut h = harness();
        h.recorder.refresh_devices();
        h.recorder.start().unwrap();
        assert!(wait_until(|| h.control.started() == 1));
        h.control.begin_track();
        assert_eq!(h.recorder.on_shutdown_requested(), ShutdownDecision::ConfirmationRequired);

        h.recorder.confirm_shutdown();

        assert_eq!(h.control.released(), 1);
        assert_eq!(h.recorder.volume().selected_device_id(), None);
        assert_eq!(h.recorder.on_shutdown_requested(), ShutdownDecision::Allow);
    }

    #[test]
    fn output_directory_locked_while_recording() {
        let mut h = harness();
        h.recorder.start().unwrap();
        assert!(!h.recorder.set_output_directory("/elsewhere"));
        assert_eq!(h.recorder.config().output_directory, std::env::temp_dir());
    }

    #[test]
    fn open_persists_to_settings_file() {
        let path = std::env::temp_dir().join(format!("recorder_open_{}.json", uuid::Uuid::new_v4()));
        let config = RecorderConfiguration {
            settings_path: path.clone(),
            ..config()
        };

        {
            let (worker, _control) = ScriptedWorker::new();
            let recorder = Recorder::open(config.clone(), worker, Arc::new(FakeGateway::default()), None).unwrap();
            recorder.adjust_order_up(false);
            recorder.log(MessageKey::Recorded, &["first"]);
        }

        let (worker, _control) = ScriptedWorker::new();
        let mut reopened = Recorder::open(config, worker, Arc::new(FakeGateway::default()), None).unwrap();
        let lines = reopened.initialize();

        assert_eq!(reopened.formatted_order_number(), "002");
        assert!(lines[0].ends_with("Recorded: first"));

        let _ = std::fs::remove_file(&path);
    }
}
