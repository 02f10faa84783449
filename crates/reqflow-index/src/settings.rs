//! Persisted view settings
//!
//! The index itself is stateless across sessions. Which fields a view
//! indexes and shows is remembered through a [`SettingsStore`], a plain
//! key-value contract owned by the host application.

use crate::error::SettingsError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key-value read/write contract
pub trait SettingsStore: Send + Sync {
    /// Stored value for `key`
    ///
    /// # Errors
    /// Returns error if the backing store cannot be read
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    /// Store `value` under `key`
    ///
    /// # Errors
    /// Returns error if the backing store cannot be written
    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Settings held in memory only
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<BTreeMap<String, Value>>,
}

impl MemorySettingsStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings persisted as one JSON object on disk
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, Value>>,
}

impl JsonFileSettingsStore {
    /// Open store, loading existing values if the file exists
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut values = self.values.write();
        // Memory changes only after the file write succeeds
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        let raw = serde_json::to_string_pretty(&next)?;
        fs::write(&self.path, raw)?;
        *values = next;
        Ok(())
    }
}

/// Indexed and visible fields of one view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    /// Fields fed to the index on rebuild
    #[serde(default)]
    pub indexed_fields: Vec<String>,
    /// Fields shown by the view
    #[serde(default)]
    pub visible_fields: Vec<String>,
}

impl IndexSettings {
    /// Settings with the given indexed fields, all visible
    #[must_use]
    pub fn with_fields<S: AsRef<str>>(fields: &[S]) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
        Self {
            indexed_fields: fields.clone(),
            visible_fields: fields,
        }
    }

    fn key(view: &str) -> String {
        format!("index.{view}")
    }

    /// Load settings for `view`; `None` if never saved
    ///
    /// # Errors
    /// Returns error if the store fails or the value has the wrong shape
    pub fn load(store: &dyn SettingsStore, view: &str) -> Result<Option<Self>, SettingsError> {
        store
            .get(&Self::key(view))?
            .map(serde_json::from_value)
            .transpose()
            .map_err(SettingsError::from)
    }

    /// Save settings for `view`
    ///
    /// # Errors
    /// Returns error if the store fails
    pub fn save(&self, store: &dyn SettingsStore, view: &str) -> Result<(), SettingsError> {
        store.set(&Self::key(view), serde_json::to_value(self)?)
    }
}
