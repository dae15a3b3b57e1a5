use crate::models::error::RecorderError;

/// Keyed durable storage for values that must survive restarts.
///
/// Implemented by:
/// - `JsonSettingsStore` (file-backed)
/// - `MemorySettingsStore` (in-process)
pub trait SettingsStore: Send + Sync {
    /// Returns `None` when nothing was ever saved under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, RecorderError>;

    /// Writes synchronously; the value is durable once this returns `Ok`.
    fn save(&self, key: &str, value: &str) -> Result<(), RecorderError>;
}
