use crate::models::audio_models::{DeviceListUpdate, VolumeUpdate};
use crate::models::error::RecorderError;
use crate::models::log_entry::StyleHint;
use crate::models::state::SessionSnapshot;

/// Event delegate for recorder notifications.
///
/// Session callbacks may arrive from the `session-timer` thread as well as
/// the caller's thread. Implementations should marshal to the UI thread if
/// needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_session_state_changed(&self, snapshot: &SessionSnapshot);

    /// Called when dependent settings surfaces must be locked or unlocked.
    fn on_settings_editable(&self, editable: bool);

    /// Called for each console line, live or replayed.
    fn on_log_appended(&self, line: &str, hint: &StyleHint);

    /// Called with the zero-padded order number after every change.
    fn on_order_number_changed(&self, formatted: &str);

    /// Called after each volume write or device re-read.
    fn on_volume_changed(&self, update: &VolumeUpdate);

    /// Called when the selectable device list is rebuilt.
    fn on_device_list_changed(&self, update: &DeviceListUpdate);

    /// Called for recoverable conditions that did not abort a command.
    fn on_error(&self, error: &RecorderError);
}
