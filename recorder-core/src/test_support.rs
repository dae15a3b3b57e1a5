//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::audio_models::{AudioEndpoint, DeviceListUpdate, VolumeUpdate};
use crate::models::error::RecorderError;
use crate::models::log_entry::StyleHint;
use crate::models::state::SessionSnapshot;
use crate::storage::settings_file::MemorySettingsStore;
use crate::traits::device_gateway::AudioDeviceGateway;
use crate::traits::recorder_delegate::RecorderDelegate;
use crate::traits::recording_worker::{DirectoryProbe, RecordingWorker, WorkerFlags};
use crate::traits::settings_store::SettingsStore;

/// Route `log` output to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Poll `condition` for up to two seconds.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[derive(Debug, Clone)]
pub enum DelegateEvent {
    State(SessionSnapshot),
    SettingsEditable(bool),
    Log(String, StyleHint),
    OrderNumber(String),
    Volume(VolumeUpdate),
    Devices(DeviceListUpdate),
    Error(RecorderError),
}

/// Delegate that records every callback.
#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<DelegateEvent>>,
}

impl RecordingDelegate {
    pub fn events(&self) -> Vec<DelegateEvent> {
        self.events.lock().clone()
    }

    pub fn states(&self) -> Vec<SessionSnapshot> {
        self.collect(|e| match e {
            DelegateEvent::State(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn editable(&self) -> Vec<bool> {
        self.collect(|e| match e {
            DelegateEvent::SettingsEditable(b) => Some(*b),
            _ => None,
        })
    }

    pub fn log_lines(&self) -> Vec<(String, StyleHint)> {
        self.collect(|e| match e {
            DelegateEvent::Log(l, h) => Some((l.clone(), h.clone())),
            _ => None,
        })
    }

    pub fn order_numbers(&self) -> Vec<String> {
        self.collect(|e| match e {
            DelegateEvent::OrderNumber(n) => Some(n.clone()),
            _ => None,
        })
    }

    pub fn volumes(&self) -> Vec<VolumeUpdate> {
        self.collect(|e| match e {
            DelegateEvent::Volume(v) => Some(*v),
            _ => None,
        })
    }

    pub fn device_lists(&self) -> Vec<DeviceListUpdate> {
        self.collect(|e| match e {
            DelegateEvent::Devices(d) => Some(d.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<RecorderError> {
        self.collect(|e| match e {
            DelegateEvent::Error(err) => Some(err.clone()),
            _ => None,
        })
    }

    fn collect<T>(&self, f: impl Fn(&DelegateEvent) -> Option<T>) -> Vec<T> {
        self.events.lock().iter().filter_map(f).collect()
    }

    fn push(&self, event: DelegateEvent) {
        self.events.lock().push(event);
    }
}

impl RecorderDelegate for RecordingDelegate {
    fn on_session_state_changed(&self, snapshot: &SessionSnapshot) {
        self.push(DelegateEvent::State(snapshot.clone()));
    }

    fn on_settings_editable(&self, editable: bool) {
        self.push(DelegateEvent::SettingsEditable(editable));
    }

    fn on_log_appended(&self, line: &str, hint: &StyleHint) {
        self.push(DelegateEvent::Log(line.to_string(), hint.clone()));
    }

    fn on_order_number_changed(&self, formatted: &str) {
        self.push(DelegateEvent::OrderNumber(formatted.to_string()));
    }

    fn on_volume_changed(&self, update: &VolumeUpdate) {
        self.push(DelegateEvent::Volume(*update));
    }

    fn on_device_list_changed(&self, update: &DeviceListUpdate) {
        self.push(DelegateEvent::Devices(update.clone()));
    }

    fn on_error(&self, error: &RecorderError) {
        self.push(DelegateEvent::Error(error.clone()));
    }
}

/// Memory store whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemorySettingsStore,
    fail: AtomicBool,
    attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn write_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SettingsStore for FlakyStore {
    fn load(&self, key: &str) -> Result<Option<String>, RecorderError> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), RecorderError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RecorderError::PersistenceWriteFailed("disk full".into()));
        }
        self.inner.save(key, value)
    }
}

#[derive(Default)]
struct GatewayState {
    devices: Vec<AudioEndpoint>,
    default_id: Option<String>,
    volumes: HashMap<String, u8>,
    mutes: HashMap<String, bool>,
}

/// In-memory audio endpoints.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
    fail_reads: AtomicBool,
}

impl FakeGateway {
    pub fn with_devices(ids: &[&str]) -> Self {
        let gateway = Self::default();
        gateway.set_devices(ids);
        {
            let mut s = gateway.state.lock();
            s.default_id = ids.first().map(|id| id.to_string());
            for id in ids {
                s.volumes.insert(id.to_string(), 50);
                s.mutes.insert(id.to_string(), false);
            }
        }
        gateway
    }

    pub fn set_devices(&self, ids: &[&str]) {
        self.state.lock().devices = ids
            .iter()
            .map(|id| AudioEndpoint::new(*id, format!("Speakers {}", id)))
            .collect();
    }

    pub fn set_default(&self, id: Option<&str>) {
        self.state.lock().default_id = id.map(str::to_string);
    }

    pub fn set_device_volume(&self, id: &str, percent: u8, muted: bool) {
        let mut s = self.state.lock();
        s.volumes.insert(id.to_string(), percent);
        s.mutes.insert(id.to_string(), muted);
    }

    /// Make volume and mute reads fail while the devices stay listed.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn volume_of(&self, id: &str) -> Option<u8> {
        self.state.lock().volumes.get(id).copied()
    }

    pub fn is_muted(&self, id: &str) -> Option<bool> {
        self.state.lock().mutes.get(id).copied()
    }

    fn check_read(&self, id: &str) -> Result<(), RecorderError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RecorderError::DeviceUnavailable);
        }
        self.check(id)
    }

    fn check(&self, id: &str) -> Result<(), RecorderError> {
        if self.state.lock().devices.iter().any(|d| d.id == id) {
            Ok(())
        } else {
            Err(RecorderError::DeviceUnavailable)
        }
    }
}

impl AudioDeviceGateway for FakeGateway {
    fn enumerate_devices(&self) -> Result<Vec<AudioEndpoint>, RecorderError> {
        Ok(self.state.lock().devices.clone())
    }

    fn default_device_id(&self) -> Option<String> {
        self.state.lock().default_id.clone()
    }

    fn get_volume(&self, device_id: &str) -> Result<u8, RecorderError> {
        self.check_read(device_id)?;
        Ok(self.state.lock().volumes.get(device_id).copied().unwrap_or(0))
    }

    fn set_volume(&self, device_id: &str, percent: u8) -> Result<(), RecorderError> {
        self.check(device_id)?;
        self.state.lock().volumes.insert(device_id.to_string(), percent);
        Ok(())
    }

    fn get_mute(&self, device_id: &str) -> Result<bool, RecorderError> {
        self.check_read(device_id)?;
        Ok(self.state.lock().mutes.get(device_id).copied().unwrap_or(false))
    }

    fn set_mute(&self, device_id: &str, muted: bool) -> Result<(), RecorderError> {
        self.check(device_id)?;
        self.state.lock().mutes.insert(device_id.to_string(), muted);
        Ok(())
    }
}

/// Remote control for `ScriptedWorker`.
#[derive(Default)]
pub struct WorkerControl {
    begin_track: AtomicBool,
    end_track: AtomicBool,
    fail: AtomicBool,
    panic: AtomicBool,
    started: AtomicUsize,
    released: AtomicUsize,
}

impl WorkerControl {
    pub fn begin_track(&self) {
        self.begin_track.store(true, Ordering::SeqCst);
    }

    pub fn end_track(&self) {
        self.end_track.store(true, Ordering::SeqCst);
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn panic(&self) {
        self.panic.store(true, Ordering::SeqCst);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

/// Counts releases of the worker's resources, like a file handle would.
struct TrackResources<'a>(&'a WorkerControl);

impl Drop for TrackResources<'_> {
    fn drop(&mut self) {
        self.0.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Worker driven step by step from the test thread.
pub struct ScriptedWorker {
    pub control: Arc<WorkerControl>,
}

impl ScriptedWorker {
    pub fn new() -> (Arc<Self>, Arc<WorkerControl>) {
        let control = Arc::new(WorkerControl::default());
        (
            Arc::new(Self {
                control: Arc::clone(&control),
            }),
            control,
        )
    }
}

impl RecordingWorker for ScriptedWorker {
    fn run(&self, flags: &WorkerFlags) -> Result<(), RecorderError> {
        let control = &*self.control;
        control.started.fetch_add(1, Ordering::SeqCst);
        let _resources = TrackResources(control);
        flags.set_ready(true);

        while flags.is_running() {
            if control.fail.swap(false, Ordering::SeqCst) {
                return Err(RecorderError::WorkerFailed("capture device lost".into()));
            }
            if control.panic.swap(false, Ordering::SeqCst) {
                panic!("worker panicked");
            }
            if control.begin_track.swap(false, Ordering::SeqCst) {
                flags.set_ready(false);
            }
            if control.end_track.swap(false, Ordering::SeqCst) {
                flags.set_ready(true);
                if flags.stop_when_ready() {
                    return Ok(());
                }
            }
            thread::sleep(Duration::from_millis(1));
        }
        Ok(())
    }
}

/// Directory probe with a fixed answer.
pub struct FixedProbe(pub bool);

impl DirectoryProbe for FixedProbe {
    fn exists(&self, _path: &std::path::Path) -> bool {
        self.0
    }
}
