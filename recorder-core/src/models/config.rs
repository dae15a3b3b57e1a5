use std::path::PathBuf;
use std::time::Duration;

use crate::numbering::order_number::{MASK_PLACEHOLDER, MAX_MASK_WIDTH, MIN_MASK_WIDTH};

/// Configuration for a recorder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderConfiguration {
    /// Directory where the worker writes tracks. Must exist before start.
    pub output_directory: PathBuf,

    /// Interval of the elapsed-time timer (default: 1 second).
    pub tick_interval: Duration,

    /// JSON file backing the persistence store.
    pub settings_path: PathBuf,

    /// Mask used when nothing valid is persisted yet (default: "000").
    pub default_order_mask: String,
}

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval.is_zero() {
            return Err("tick interval must be positive".into());
        }
        if self.tick_interval > Duration::from_secs(10) {
            return Err(format!("tick interval too long: {:?}", self.tick_interval));
        }
        let width = self.default_order_mask.len();
        if !(MIN_MASK_WIDTH..=MAX_MASK_WIDTH).contains(&width) {
            return Err(format!("unsupported mask width: {}", width));
        }
        if self.default_order_mask.chars().any(|c| c != MASK_PLACEHOLDER) {
            return Err(format!("invalid mask: {:?}", self.default_order_mask));
        }
        Ok(())
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            tick_interval: Duration::from_secs(1),
            settings_path: PathBuf::from("recorder-settings.json"),
            default_order_mask: "000".into(),
        }
    }
}
