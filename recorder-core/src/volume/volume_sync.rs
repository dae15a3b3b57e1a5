use std::sync::Arc;

use crate::models::audio_models::{AudioEndpoint, AudioEndpointState, DeviceListUpdate, VolumeBand, VolumeUpdate};
use crate::models::error::RecorderError;
use crate::traits::device_gateway::AudioDeviceGateway;
use crate::traits::recorder_delegate::RecorderDelegate;
use crate::traits::settings_store::SettingsStore;

pub const AUDIO_DEVICE_KEY: &str = "audio_endpoint_device_id";

const MAX_PERCENT: u8 = 100;

/// Round a slider request up to the even step the OS volume is kept at.
pub fn quantize_percent(requested: u8) -> u8 {
    let v = requested.min(MAX_PERCENT);
    v + v % 2
}

/// Percent to the `[0.0, 1.0]` scalar used by endpoint volume APIs.
pub fn percent_to_scalar(percent: u8) -> f32 {
    f32::from(percent.min(MAX_PERCENT)) / 100.0
}

/// Scalar endpoint volume back to percent. NaN reads as silence.
pub fn scalar_to_percent(scalar: f32) -> u8 {
    (scalar.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Keeps the selected endpoint's volume and mute state in step with the
/// slider and device selector.
///
/// The gateway owns device lifetime. This type only remembers the selected
/// id, which may go stale at any time; every gateway failure is resolved by
/// re-running device selection.
pub struct AudioVolumeSync {
    gateway: Arc<dyn AudioDeviceGateway>,
    store: Option<Arc<dyn SettingsStore>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    devices: Vec<AudioEndpoint>,
    state: AudioEndpointState,
    band: VolumeBand,
}

impl AudioVolumeSync {
    pub fn new(gateway: Arc<dyn AudioDeviceGateway>) -> Self {
        Self {
            gateway,
            store: None,
            delegate: None,
            devices: Vec::new(),
            state: AudioEndpointState::default(),
            band: VolumeBand::default(),
        }
    }

    /// Create a synchronizer that prefers the device selected in a previous
    /// run. Call `refresh_devices` afterwards to apply the selection.
    pub fn load(gateway: Arc<dyn AudioDeviceGateway>, store: Arc<dyn SettingsStore>) -> Self {
        let remembered = match store.load(AUDIO_DEVICE_KEY) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                log::warn!("Failed to read {}: {}", AUDIO_DEVICE_KEY, e);
                None
            }
        };

        let mut sync = Self::new(gateway);
        sync.state.device_id = remembered;
        sync.store = Some(store);
        sync
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> &AudioEndpointState {
        &self.state
    }

    pub fn devices(&self) -> &[AudioEndpoint] {
        &self.devices
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.state.device_id.as_deref()
    }

    pub fn band(&self) -> VolumeBand {
        self.band
    }

    /// Apply a slider request to the selected device.
    ///
    /// A muted device is unmuted first. The written value is rounded up to
    /// an even percent.
    pub fn set_volume(&mut self, requested: u8) -> Result<VolumeUpdate, RecorderError> {
        let device_id = match (self.devices.is_empty(), self.state.device_id.clone()) {
            (false, Some(id)) => id,
            _ => return Err(RecorderError::DeviceUnavailable),
        };

        match self.write_volume(&device_id, quantize_percent(requested)) {
            Ok(update) => Ok(update),
            Err(e) => {
                log::warn!("Volume write to {} failed: {}", device_id, e);
                self.refresh_devices();
                Err(e)
            }
        }
    }

    /// The OS or the user picked another endpoint.
    ///
    /// Falls back to the default device, then to the first listed one, when
    /// `device_id` is not enumerable.
    pub fn on_device_changed(&mut self, device_id: &str) {
        let devices = self.enumerate();
        self.select_from(devices, Some(device_id));
    }

    /// Clear the selection and disable every volume control.
    pub fn on_device_list_empty(&mut self) {
        log::warn!("No audio endpoint available; volume controls disabled");
        self.devices.clear();
        self.state = AudioEndpointState::default();
        self.emit_device_list(false);
    }

    /// Re-enumerate, keeping the current device when it is still listed.
    pub fn refresh_devices(&mut self) {
        let devices = self.enumerate();
        let current = self.state.device_id.clone();
        self.select_from(devices, current.as_deref());
    }

    /// Drop the selection during shutdown.
    pub fn release(&mut self) {
        if self.state.device_id.is_none() && self.devices.is_empty() {
            return;
        }
        log::debug!("Releasing audio endpoint selection");
        self.devices.clear();
        self.state = AudioEndpointState::default();
    }

    // --- Internal helpers ---

    fn enumerate(&self) -> Vec<AudioEndpoint> {
        self.gateway.enumerate_devices().unwrap_or_else(|e| {
            log::warn!("Audio endpoint enumeration failed: {}", e);
            Vec::new()
        })
    }

    fn select_from(&mut self, devices: Vec<AudioEndpoint>, preferred: Option<&str>) {
        if devices.is_empty() {
            self.on_device_list_empty();
            return;
        }

        let listed = |id: &str| devices.iter().any(|d| d.id == id);
        let default_id = self.gateway.default_device_id();
        let chosen = preferred
            .filter(|id| listed(*id))
            .or_else(|| default_id.as_deref().filter(|id| listed(*id)))
            .map(str::to_string)
            .or_else(|| devices.first().map(|d| d.id.clone()));

        let Some(chosen) = chosen else {
            self.on_device_list_empty();
            return;
        };
        if preferred.is_some_and(|p| p != chosen) {
            log::warn!("Audio endpoint {:?} unavailable, falling back to {}", preferred, chosen);
        }

        // An unreadable level keeps the last known one and is not announced.
        let reading = match (self.gateway.get_volume(&chosen), self.gateway.get_mute(&chosen)) {
            (Ok(v), Ok(m)) => Some((quantize_percent(v), m)),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Failed to read volume of {}: {}", chosen, e);
                None
            }
        };
        let (volume_percent, muted) = reading.unwrap_or((self.state.volume_percent, self.state.muted));

        let changed = self.state.device_id.as_deref() != Some(chosen.as_str());
        self.state = AudioEndpointState {
            device_name: devices.iter().find(|d| d.id == chosen).map(|d| d.name.clone()),
            device_id: Some(chosen.clone()),
            volume_percent,
            muted,
        };
        self.devices = devices;

        if changed {
            self.persist_selection(&chosen);
        }
        self.emit_device_list(true);
        if reading.is_some() {
            self.emit_volume();
        }
    }

    fn write_volume(&mut self, device_id: &str, percent: u8) -> Result<VolumeUpdate, RecorderError> {
        if self.gateway.get_mute(device_id)? {
            self.gateway.set_mute(device_id, false)?;
            log::debug!("Unmuted {} on volume change", device_id);
        }
        self.gateway.set_volume(device_id, percent)?;

        self.state.muted = false;
        self.state.volume_percent = percent;
        Ok(self.emit_volume())
    }

    fn persist_selection(&self, device_id: &str) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(AUDIO_DEVICE_KEY, device_id) {
                log::warn!("Failed to persist audio endpoint selection: {}", e);
            }
        }
    }

    fn emit_volume(&mut self) -> VolumeUpdate {
        let band = VolumeBand::from_percent(self.state.volume_percent);
        let update = VolumeUpdate {
            percent: self.state.volume_percent,
            band,
            band_changed: band != self.band,
        };
        self.band = band;

        if let Some(delegate) = &self.delegate {
            delegate.on_volume_changed(&update);
        }
        update
    }

    fn emit_device_list(&self, controls_enabled: bool) {
        let update = DeviceListUpdate {
            devices: self.devices.clone(),
            selected: self.state.device_id.clone(),
            selector_enabled: self.devices.len() > 1,
            controls_enabled,
        };
        if let Some(delegate) = &self.delegate {
            delegate.on_device_list_changed(&update);
        }
    }
}
