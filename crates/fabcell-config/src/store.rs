// SPDX-License-Identifier: Apache-2.0
//! Storage port for config blobs, and a thin service that serializes
//! values over it.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Storage port for raw config blobs, keyed by logical name.
pub trait ConfigStore {
    /// Loads a raw blob. Returns `NotFound` when the key is absent.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persists a raw blob, creating the key if absent.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures surfaced by a [`ConfigStore`] or [`ConfigService`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The key has never been saved.
    #[error("not found")]
    NotFound,
    /// Failed to read or write the underlying storage.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to serialize or deserialize the value.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The platform config directory could not be resolved.
    #[error("{0}")]
    Other(String),
}

/// Serializes typed values to JSON and delegates storage to a
/// [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Loads and deserializes `key`, or `Ok(None)` if it has never
    /// been saved.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serializes and persists `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}
