//! Render endpoint enumeration via the MMDevice API.
//!
//! Wraps `IMMDeviceEnumerator` to list active render (speaker/headphone)
//! endpoints with their friendly names, and to reopen an endpoint by id.

use windows::core::PCWSTR;
use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;

use recorder_core::models::audio_models::AudioEndpoint;
use recorder_core::models::error::RecorderError;

/// COM initialization scope for the calling thread.
///
/// A thread that already joined a single-threaded apartment (a UI thread)
/// keeps it; COM is usable there and must not be uninitialized by us.
pub(crate) struct ComApartment {
    owned: bool,
}

impl ComApartment {
    pub(crate) fn enter() -> Result<Self, RecorderError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            return Ok(Self { owned: false });
        }
        hr.ok().map_err(|e| {
            log::warn!("CoInitializeEx failed: {}", e);
            RecorderError::DeviceUnavailable
        })?;
        Ok(Self { owned: true })
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.owned {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// Render endpoint enumerator using the Windows MMDevice API.
pub struct EndpointEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl EndpointEnumerator {
    /// Create a new enumerator.
    ///
    /// Requires COM to be initialized on the calling thread.
    pub fn new() -> Result<Self, RecorderError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator = CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                .map_err(|e| {
                    log::warn!("Failed to create device enumerator: {}", e);
                    RecorderError::DeviceUnavailable
                })?;
            Ok(Self { enumerator })
        }
    }

    /// Active render endpoints in enumeration order.
    pub fn list_render_endpoints(&self) -> Result<Vec<AudioEndpoint>, RecorderError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)
                .map_err(|e| {
                    log::warn!("EnumAudioEndpoints failed: {}", e);
                    RecorderError::DeviceUnavailable
                })?;

            let count = collection.GetCount().map_err(|e| {
                log::warn!("GetCount failed: {}", e);
                RecorderError::DeviceUnavailable
            })?;

            let mut endpoints = Vec::new();
            for i in 0..count {
                let Ok(device) = collection.Item(i) else {
                    continue;
                };
                let Some(id) = Self::device_id(&device) else {
                    continue;
                };
                let name = Self::friendly_name(&device).unwrap_or_else(|| format!("Device {}", i));
                endpoints.push(AudioEndpoint::new(id, name));
            }

            Ok(endpoints)
        }
    }

    /// Id of the default console render endpoint.
    pub fn default_render_id(&self) -> Option<String> {
        unsafe {
            let device = self.enumerator.GetDefaultAudioEndpoint(eRender, eConsole).ok()?;
            Self::device_id(&device)
        }
    }

    /// Reopen an endpoint by id.
    pub fn open(&self, device_id: &str) -> Result<IMMDevice, RecorderError> {
        let wide_id: Vec<u16> = device_id.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe {
            self.enumerator
                .GetDevice(PCWSTR(wide_id.as_ptr()))
                .map_err(|_| RecorderError::DeviceUnavailable)
        }
    }

    fn device_id(device: &IMMDevice) -> Option<String> {
        unsafe {
            let raw = device.GetId().ok()?;
            let id = raw.to_string().ok();
            CoTaskMemFree(Some(raw.0 as *const _));
            id
        }
    }

    /// Read the PKEY_Device_FriendlyName property from a device.
    fn friendly_name(device: &IMMDevice) -> Option<String> {
        unsafe {
            let store = device.OpenPropertyStore(STGM_READ).ok()?;
            let value = store.GetValue(&PKEY_Device_FriendlyName).ok()?;
            let name = value.to_string();
            (!name.is_empty()).then_some(name)
        }
    }
}
