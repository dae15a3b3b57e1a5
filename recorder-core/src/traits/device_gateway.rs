use crate::models::audio_models::AudioEndpoint;
use crate::models::error::RecorderError;

/// Access to the OS audio endpoints.
///
/// Device lifetime belongs to the OS; ids are opaque and may disappear
/// between calls, in which case methods return `DeviceUnavailable`.
///
/// Implemented by:
/// - `MmDeviceGateway` (Windows)
pub trait AudioDeviceGateway: Send + Sync {
    /// Active render endpoints, in enumeration order.
    fn enumerate_devices(&self) -> Result<Vec<AudioEndpoint>, RecorderError>;

    /// Id of the OS default endpoint, if there is one.
    fn default_device_id(&self) -> Option<String>;

    /// Master volume in percent (0–100).
    fn get_volume(&self, device_id: &str) -> Result<u8, RecorderError>;

    fn set_volume(&self, device_id: &str, percent: u8) -> Result<(), RecorderError>;

    fn get_mute(&self, device_id: &str) -> Result<bool, RecorderError>;

    fn set_mute(&self, device_id: &str, muted: bool) -> Result<(), RecorderError>;
}
