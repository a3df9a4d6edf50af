//! Pluggable cart persistence backends.
//!
//! The store keeps its lines as one JSON document under a single key, the
//! way a browser cart lives under `localStorage["cart"]`. Backends only
//! move opaque strings; (de)serialization belongs to the store.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

/// Errors from a cart storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("cart storage I/O: {0}")]
    Io(#[from] io::Error),
    /// The backend's lock was poisoned by a panicking writer.
    #[error("cart storage lock poisoned")]
    Poisoned,
}

/// A key-value slot holding the serialized cart.
pub trait CartStorage: Send + Sync {
    /// Load the stored payload, `None` if nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored payload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn save(&self, payload: &str) -> Result<(), StorageError>;
}

/// In-memory storage for tests and ephemeral carts.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot pre-populated with a raw payload (corrupt-data tests).
    #[must_use]
    pub fn with_payload(payload: &str) -> Self {
        Self {
            slot: Mutex::new(Some(payload.to_owned())),
        }
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        let slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, payload: &str) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(payload.to_owned());
        Ok(())
    }
}

/// File-backed storage: one JSON document on disk.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Store the cart at the given path. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn save(&self, payload: &str) -> Result<(), StorageError> {
        std::fs::write(&self.path, payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.load().expect("load").is_none());

        storage.save("[]").expect("save");
        assert_eq!(storage.load().expect("load").as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let storage = JsonFileStorage::new("/nonexistent/dir/cart.json");
        assert!(storage.load().expect("load").is_none());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "mercadito-cart-test-{}.json",
            std::process::id()
        ));
        let storage = JsonFileStorage::new(&path);

        storage.save("[{\"id\":1}]").expect("save");
        assert_eq!(
            storage.load().expect("load").as_deref(),
            Some("[{\"id\":1}]")
        );

        std::fs::remove_file(&path).expect("cleanup");
    }
}
