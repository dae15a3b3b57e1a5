//! # recorder-core
//!
//! Platform-agnostic core of the desktop recorder.
//!
//! Provides the recording session state machine, the persisted console
//! journal, the track order number and the endpoint volume synchronizer.
//! Platform backends implement `AudioDeviceGateway` and `RecordingWorker`
//! and plug into the `Recorder` facade.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── traits/     ← RecordingWorker, AudioDeviceGateway, SettingsStore, MessageResolver, RecorderDelegate
//! ├── models/     ← RecorderError, SessionState, RecorderConfiguration, LogEntry, audio models
//! ├── session/    ← SessionController, Recorder facade
//! ├── journal/    ← LogJournal, TemplateCatalog
//! ├── numbering/  ← OrderNumberMask
//! ├── volume/     ← AudioVolumeSync
//! └── storage/    ← JsonSettingsStore, MemorySettingsStore
//! ```

pub mod journal;
pub mod models;
pub mod numbering;
pub mod session;
pub mod storage;
pub mod traits;
pub mod volume;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use journal::log_journal::LogJournal;
pub use journal::templates::TemplateCatalog;
pub use models::audio_models::{AudioEndpoint, AudioEndpointState, DeviceListUpdate, VolumeBand, VolumeUpdate};
pub use models::config::RecorderConfiguration;
pub use models::error::RecorderError;
pub use models::log_entry::{Emphasis, LogCategory, LogEntry, MessageKey, StyleHint};
pub use models::state::{SessionSnapshot, SessionState, ShutdownDecision, StopReason};
pub use numbering::order_number::OrderNumberMask;
pub use session::controller::{SessionController, SessionEvent, SessionEventCallback};
pub use session::recorder::Recorder;
pub use storage::settings_file::{JsonSettingsStore, MemorySettingsStore};
pub use traits::device_gateway::AudioDeviceGateway;
pub use traits::message_resolver::MessageResolver;
pub use traits::recorder_delegate::RecorderDelegate;
pub use traits::recording_worker::{DirectoryProbe, FsDirectoryProbe, RecordingWorker, WorkerFlags};
pub use traits::settings_store::SettingsStore;
pub use volume::volume_sync::{percent_to_scalar, scalar_to_percent, AudioVolumeSync};
