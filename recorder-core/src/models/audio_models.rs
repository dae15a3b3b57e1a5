use serde::{Deserialize, Serialize};

/// An audio endpoint the user can route recording through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioEndpoint {
    pub id: String,
    pub name: String,
}

impl AudioEndpoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Volume icon shown next to the slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VolumeBand {
    #[default]
    Muted,
    Low,
    High,
}

impl VolumeBand {
    /// Upper bound (exclusive) of the low band.
    pub const LOW_CEILING: u8 = 30;

    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0 => Self::Muted,
            p if p < Self::LOW_CEILING => Self::Low,
            _ => Self::High,
        }
    }
}

/// Volume state of the selected endpoint as mirrored by the core.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioEndpointState {
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub volume_percent: u8,
    pub muted: bool,
}

/// Emitted after each volume write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeUpdate {
    pub percent: u8,
    pub band: VolumeBand,
    /// False when the icon is already correct and needs no redraw.
    pub band_changed: bool,
}

/// Emitted whenever the selectable device list is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceListUpdate {
    pub devices: Vec<AudioEndpoint>,
    pub selected: Option<String>,
    /// The selector is only useful with two devices or more.
    pub selector_enabled: bool,
    /// Slider, icon and label are hidden without a selected device.
    pub controls_enabled: bool,
}
