//! File-backed key-value storage for local state.
//!
//! Each key is a JSON file in the data directory. The keys mirror the entries
//! the browser front desk kept in local storage, so the files can be seeded
//! from an export of that state.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;

/// The fixed keys persisted by the front desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Full visitor record list (JSON array).
    Visitors,
    /// Cached responsible-party names (JSON array).
    Responsibles,
    /// Spreadsheet webhook URL saved from the settings command.
    WebhookUrl,
}

impl StorageKey {
    pub fn name(&self) -> &'static str {
        match self {
            StorageKey::Visitors => "access_control_visitors",
            StorageKey::Responsibles => "cached_responsibles",
            StorageKey::WebhookUrl => "sheet_webhook_url",
        }
    }

    pub fn filename(&self) -> String {
        format!("{}.json", self.name())
    }
}

/// Key-value storage rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    data_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Returns the full path for a key.
    pub fn path(&self, key: StorageKey) -> PathBuf {
        self.data_dir.join(key.filename())
    }

    pub fn exists(&self, key: StorageKey) -> bool {
        self.path(key).exists()
    }

    /// Reads and decodes a key.
    ///
    /// Returns `Ok(None)` if nothing has been stored under the key yet.
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>, StorageError> {
        let path = self.path(key);

        match fs::read(&path) {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::ParseError(path, e))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    /// Encodes and writes a key, creating the data directory if needed.
    pub fn save<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))?;

        let path = self.path(key);
        let bytes = serde_json::to_vec(value).map_err(|e| StorageError::ParseError(path.clone(), e))?;

        fs::write(&path, bytes).map_err(|e| StorageError::IoError(path, e))?;

        Ok(())
    }

    /// Deletes a key. Removing a missing key is not an error.
    pub fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    /// The webhook URL saved by the settings command, if any.
    pub fn webhook_url(&self) -> Result<Option<String>, StorageError> {
        let url: Option<String> = self.load(StorageKey::WebhookUrl)?;
        Ok(url.filter(|u| !u.trim().is_empty()))
    }

    pub fn save_webhook_url(&self, url: &str) -> Result<(), StorageError> {
        self.save(StorageKey::WebhookUrl, url.trim())
    }
}

/// Errors that can occur while reading or writing local state.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// The stored JSON could not be encoded or decoded.
    ParseError(PathBuf, serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::ParseError(path, e) => {
                write!(f, "Invalid JSON in {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::ParseError(_, e) => Some(e),
        }
    }
}
