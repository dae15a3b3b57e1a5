use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::models::error::RecorderError;
use crate::traits::settings_store::SettingsStore;

const DOCUMENT_VERSION: u32 = 1;

/// On-disk layout of the settings file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    version: u32,
    values: BTreeMap<String, String>,
}

/// Settings persisted as a single pretty-printed JSON file.
///
/// Every `save` rewrites the whole document. Values live in an in-memory
/// cache first, so a failed write is retried by the next successful one.
pub struct JsonSettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonSettingsStore {
    /// Open the store, reading the file if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RecorderError> {
        let path = path.into();
        let values = if path.exists() {
            let json = fs::read_to_string(&path)
                .map_err(|e| RecorderError::PersistenceReadFailed(format!("failed to read settings: {}", e)))?;
            let doc: SettingsDocument = serde_json::from_str(&json)
                .map_err(|e| RecorderError::PersistenceReadFailed(format!("failed to parse settings: {}", e)))?;
            if doc.version != DOCUMENT_VERSION {
                log::warn!("Settings file version {} differs from {}", doc.version, DOCUMENT_VERSION);
            }
            doc.values
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open the store, starting empty if the file is unreadable or corrupt.
    pub fn open_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(path.clone()) {
            Ok(store) => store,
            Err(e) => {
                log::warn!("{}; starting with empty settings", e);
                Self {
                    path,
                    values: Mutex::new(BTreeMap::new()),
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, values: &BTreeMap<String, String>) -> Result<(), RecorderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RecorderError::PersistenceWriteFailed(format!("failed to create directory: {}", e))
            })?;
        }
        let doc = SettingsDocument {
            version: DOCUMENT_VERSION,
            values: values.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| RecorderError::PersistenceWriteFailed(format!("failed to serialize settings: {}", e)))?;
        fs::write(&self.path, json)
            .map_err(|e| RecorderError::PersistenceWriteFailed(format!("failed to write settings: {}", e)))
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>, RecorderError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), RecorderError> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        self.write_document(&values)
    }
}

/// Settings kept in process memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.lock().insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: &str) -> Result<Option<String>, RecorderError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), RecorderError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
