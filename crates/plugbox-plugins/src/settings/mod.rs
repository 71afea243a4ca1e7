//! Per-plugin persisted settings.
//!
//! Each plugin owns one JSON object at `<data_dir>/settings/<id>.json`. Values
//! are read and written through `serde`, and every write replaces the file
//! atomically.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::descriptor::PluginId;
use crate::error::PluginError;

const SETTINGS_TARGET: &str = "plugbox_plugins::settings";
const SETTINGS_DIR: &str = "settings";

/// Handle to the settings of one plugin.
///
/// Clones share a write lock, so read-modify-write cycles through any clone
/// are serialised.
#[derive(Debug, Clone)]
pub struct PluginSettings {
    id: PluginId,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl PluginSettings {
    /// Opens the settings of `id` below `data_dir`. Nothing is read or
    /// created until the first access.
    #[must_use]
    pub fn new(data_dir: &Path, id: &PluginId) -> Self {
        Self {
            id: id.clone(),
            path: settings_path(data_dir, id),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads `key`, or `None` when it was never stored.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] when the file cannot be read and
    /// [`PluginError::Persistence`] when it or the value is malformed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PluginError> {
        let _guard = self.lock.lock();
        let values = self.read()?;
        values
            .get(key)
            .cloned()
            .map(|value| self.decode(key, value))
            .transpose()
    }

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Persistence`] when the value cannot be encoded
    /// and [`PluginError::Io`] when the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PluginError> {
        let encoded = serde_json::to_value(value).map_err(|error| self.persistence(&error))?;
        let _guard = self.lock.lock();
        let mut values = self.read()?;
        values.insert(key.to_owned(), encoded);
        self.write(&values)
    }

    /// Returns the stored `key`, storing and returning `default` when absent.
    ///
    /// # Errors
    ///
    /// Propagates read, decode and write failures.
    pub fn get_or_init<T: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T, PluginError> {
        let _guard = self.lock.lock();
        let mut values = self.read()?;
        if let Some(value) = values.get(key) {
            return self.decode(key, value.clone());
        }
        let encoded = serde_json::to_value(&default).map_err(|error| self.persistence(&error))?;
        values.insert(key.to_owned(), encoded);
        self.write(&values)?;
        Ok(default)
    }

    /// Deletes `key`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Propagates read and write failures.
    pub fn remove(&self, key: &str) -> Result<bool, PluginError> {
        let _guard = self.lock.lock();
        let mut values = self.read()?;
        if values.remove(key).is_none() {
            return Ok(false);
        }
        self.write(&values)?;
        Ok(true)
    }

    /// Lists stored keys in sorted order.
    ///
    /// # Errors
    ///
    /// Propagates read failures.
    pub fn keys(&self) -> Result<Vec<String>, PluginError> {
        let _guard = self.lock.lock();
        Ok(self.read()?.keys().cloned().collect())
    }

    /// Deletes the backing file.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Io`] when an existing file cannot be removed.
    pub fn clear(&self) -> Result<(), PluginError> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(PluginError::io(&self.path, error)),
        }
    }

    fn read(&self) -> Result<Map<String, Value>, PluginError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(PluginError::io(&self.path, error)),
        };
        serde_json::from_str(&text).map_err(|error| self.persistence(&error))
    }

    fn write(&self, values: &Map<String, Value>) -> Result<(), PluginError> {
        let directory = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(directory).map_err(|error| PluginError::io(directory, error))?;

        let text = serde_json::to_vec_pretty(values).map_err(|error| self.persistence(&error))?;
        let mut file =
            NamedTempFile::new_in(directory).map_err(|error| PluginError::io(directory, error))?;
        file.write_all(&text)
            .map_err(|error| PluginError::io(file.path(), error))?;
        file.persist(&self.path)
            .map_err(|error| PluginError::io(&self.path, error.error))?;

        tracing::debug!(
            target: SETTINGS_TARGET,
            plugin = %self.id,
            keys = values.len(),
            "settings written"
        );
        Ok(())
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, value: Value) -> Result<T, PluginError> {
        serde_json::from_value(value).map_err(|error| PluginError::Persistence {
            plugin: self.id.to_string(),
            message: format!("setting '{key}' has an unexpected shape: {error}"),
        })
    }

    fn persistence(&self, error: &serde_json::Error) -> PluginError {
        PluginError::Persistence {
            plugin: self.id.to_string(),
            message: error.to_string(),
        }
    }
}

/// Returns where the settings of `id` live below `data_dir`.
#[must_use]
pub fn settings_path(data_dir: &Path, id: &PluginId) -> PathBuf {
    data_dir
        .join(SETTINGS_DIR)
        .join(format!("{}.json", id.as_str()))
}
