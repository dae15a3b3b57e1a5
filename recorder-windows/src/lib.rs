//! # recorder-windows
//!
//! Windows MMDevice backend for recorder-core.
//!
//! Provides:
//! - `MmDeviceGateway`: `AudioDeviceGateway` over render endpoints, reading
//!   and writing master volume and mute via `IAudioEndpointVolume`
//! - `EndpointEnumerator`: render endpoint listing with friendly names
//!
//! ## Platform Requirements
//! - Windows 7+ for `IAudioEndpointVolume`
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! On other targets this crate is empty.
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use recorder_core::{Recorder, RecorderConfiguration};
//! use recorder_windows::MmDeviceGateway;
//!
//! let mut recorder = Recorder::open(config, worker, Arc::new(MmDeviceGateway::new()), Some(delegate))?;
//! recorder.initialize();
//! ```

#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod endpoint_volume;

#[cfg(target_os = "windows")]
pub use device_enumerator::EndpointEnumerator;
#[cfg(target_os = "windows")]
pub use endpoint_volume::MmDeviceGateway;
