//! Where the feed's geo filter comes from.
//!
//! The selected location lives in durable client storage under
//! [`SELECTED_LOCATION_KEY`]. The feed controller receives a
//! [`LocationProvider`] at construction and reads it once per fetch.

use std::path::{Path, PathBuf};

use classifieds_core::Location;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StorageError;

pub const SELECTED_LOCATION_KEY: &str = "selectedLocation";

pub trait LocationProvider: Send + Sync {
    /// The location to append to feed queries, if one has been chosen.
    fn current(&self) -> Option<Location>;
}

/// A fixed location (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticLocation(pub Option<Location>);

impl LocationProvider for StaticLocation {
    fn current(&self) -> Option<Location> {
        self.0.clone()
    }
}

/// Durable key-value storage backed by a single JSON object file.
///
/// A missing file reads as empty. Writes go to a sibling temp file that is
/// then renamed over the original.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StorageError::Io {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content).map_err(|e| StorageError::Parse {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let rendered = serde_json::to_string_pretty(map).map_err(|e| StorageError::Parse {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, rendered).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)
    }

    /// Reads and deserializes one key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be read or parsed, or the
    /// stored value does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut map = self.read_all()?;
        match map.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Value {
                    key: key.to_owned(),
                    source: e,
                }),
        }
    }

    /// Stores one key, keeping every other key intact.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be read, parsed or written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let mut map = self.read_all()?;
        let value = serde_json::to_value(value).map_err(|e| StorageError::Value {
            key: key.to_owned(),
            source: e,
        })?;
        map.insert(key.to_owned(), value);
        self.write_all(&map)
    }

    /// Removes one key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file cannot be read, parsed or written.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

impl LocationProvider for JsonFileStore {
    fn current(&self) -> Option<Location> {
        match self.get::<Location>(SELECTED_LOCATION_KEY) {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable selected location");
                None
            }
        }
    }
}
