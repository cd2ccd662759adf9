//! Persistence Stores
//!
//! A persisted cell loads its initial value from a [`Storage`] and writes
//! every value change back to it. Values cross this boundary as JSON text.
//!
//! Failures on either path are reported through `tracing` and never reach
//! the code reading or writing the cell: a failed load keeps the initial
//! value, a failed store keeps the new in-memory value.

mod file;
mod memory;

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// A string key-value store.
pub trait Storage: Send + Sync {
    /// The stored text for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

static DEFAULT_STORAGE: OnceLock<RwLock<Arc<dyn Storage>>> = OnceLock::new();

fn default_slot() -> &'static RwLock<Arc<dyn Storage>> {
    DEFAULT_STORAGE.get_or_init(|| RwLock::new(Arc::new(MemoryStorage::new())))
}

/// The process-wide store used by [`Signal::with_config`].
///
/// Starts out as an empty [`MemoryStorage`].
///
/// [`Signal::with_config`]: crate::reactive::Signal::with_config
pub fn default_storage() -> Arc<dyn Storage> {
    default_slot().read().clone()
}

/// Replace the process-wide store. Cells created earlier keep the store they
/// were created with.
pub fn set_default_storage(storage: Arc<dyn Storage>) {
    *default_slot().write() = storage;
}

/// Load and decode the value under `key`.
///
/// `Ok(None)` when nothing is stored.
pub fn load<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>> {
    let Some(text) = storage.get(key) else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| Error::Decode {
            key: key.to_string(),
            source,
        })
}

/// Encode `value` and store it under `key`.
pub fn store<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value).map_err(|source| Error::Encode {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &text)
}
