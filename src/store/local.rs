//! File-backed key-value storage for guest diaries.
//!
//! Each key is one JSON file in the data directory:
//! ```text
//! <DATA_DIR>/
//!   entry-2024-03-01.json
//!   entry-2024-03-02.json
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::error::StorageError;

/// Durable local storage, one file per key.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    data_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the file path for a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Reads the raw value for a key. `Ok(None)` if the key was never written.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }

    /// Overwrites the value for a key, creating the data directory if needed.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::Io(self.data_dir.clone(), e))?;

        let path = self.path(key);
        fs::write(&path, value).map_err(|e| StorageError::Io(path, e))
    }

    /// Reads and decodes a JSON value. `Ok(None)` if absent.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key)? {
            Some(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(|e| StorageError::Parse(key.to_string(), e)),
            None => Ok(None),
        }
    }

    /// Encodes a value as JSON and overwrites the key with it.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(value).map_err(|e| StorageError::Encode(key.to_string(), e))?;
        self.set_item(key, &json)
    }
}
