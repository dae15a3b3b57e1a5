//! Endpoint master volume and mute through `IAudioEndpointVolume`.
//!
//! Every call runs in its own COM scope and reopens the endpoint by id, so
//! the gateway holds no COM object and can be used from any thread. A
//! device that vanished between calls surfaces as `DeviceUnavailable`.

use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
use windows::Win32::System::Com::CLSCTX_ALL;

use recorder_core::models::audio_models::AudioEndpoint;
use recorder_core::models::error::RecorderError;
use recorder_core::traits::device_gateway::AudioDeviceGateway;
use recorder_core::volume::volume_sync::{percent_to_scalar, scalar_to_percent};

use crate::device_enumerator::{ComApartment, EndpointEnumerator};

/// `AudioDeviceGateway` over the Windows render endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct MmDeviceGateway;

impl MmDeviceGateway {
    pub fn new() -> Self {
        Self
    }

    fn with_enumerator<T>(
        &self,
        f: impl FnOnce(&EndpointEnumerator) -> Result<T, RecorderError>,
    ) -> Result<T, RecorderError> {
        let _com = ComApartment::enter()?;
        let enumerator = EndpointEnumerator::new()?;
        f(&enumerator)
    }

    fn with_endpoint<T>(
        &self,
        device_id: &str,
        f: impl FnOnce(&IAudioEndpointVolume) -> windows::core::Result<T>,
    ) -> Result<T, RecorderError> {
        self.with_enumerator(|enumerator| {
            let device = enumerator.open(device_id)?;
            unsafe {
                let endpoint: IAudioEndpointVolume = device.Activate(CLSCTX_ALL, None).map_err(|e| {
                    log::warn!("Activate IAudioEndpointVolume on {} failed: {}", device_id, e);
                    RecorderError::DeviceUnavailable
                })?;
                f(&endpoint).map_err(|e| {
                    log::warn!("Endpoint volume call on {} failed: {}", device_id, e);
                    RecorderError::DeviceUnavailable
                })
            }
        })
    }
}

impl AudioDeviceGateway for MmDeviceGateway {
    fn enumerate_devices(&self) -> Result<Vec<AudioEndpoint>, RecorderError> {
        self.with_enumerator(|enumerator| enumerator.list_render_endpoints())
    }

    fn default_device_id(&self) -> Option<String> {
        self.with_enumerator(|enumerator| Ok(enumerator.default_render_id()))
            .ok()
            .flatten()
    }

    fn get_volume(&self, device_id: &str) -> Result<u8, RecorderError> {
        let scalar = self.with_endpoint(device_id, |endpoint| unsafe { endpoint.GetMasterVolumeLevelScalar() })?;
        Ok(scalar_to_percent(scalar))
    }

    fn set_volume(&self, device_id: &str, percent: u8) -> Result<(), RecorderError> {
        let scalar = percent_to_scalar(percent);
        self.with_endpoint(device_id, |endpoint| unsafe {
            endpoint.SetMasterVolumeLevelScalar(scalar, std::ptr::null())
        })
    }

    fn get_mute(&self, device_id: &str) -> Result<bool, RecorderError> {
        let muted = self.with_endpoint(device_id, |endpoint| unsafe { endpoint.GetMute() })?;
        Ok(muted.into())
    }

    fn set_mute(&self, device_id: &str, muted: bool) -> Result<(), RecorderError> {
        self.with_endpoint(device_id, |endpoint| unsafe { endpoint.SetMute(muted, std::ptr::null()) })
    }
}
