//! Session persistence boundary.
//!
//! The core only ever talks to [`SessionPersistence`]. The bundled
//! [`KeyValueSessionPersistence`] keeps the record as one JSON blob under a
//! single key of any [`KeyValueStore`], matching the preference-store layout
//! used on device.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{MigrationError, SessionRecord};

/// Key the session blob is stored under by default.
pub const DEFAULT_SESSION_KEY: &str = "LAST_GAME";

/// Failures crossing the persistence boundary.
///
/// "No session stored" is not an error; it loads as [`SessionRecord::null`].
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session blob could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store backend failed for key {key}: {message}")]
    Backend { key: String, message: String },
    #[error("stored session could not be migrated: {0}")]
    Migration(#[from] MigrationError),
}

impl PersistenceError {
    pub fn backend(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Asynchronous load/store of the session record.
#[async_trait]
pub trait SessionPersistence: Send + Sync {
    /// Load the stored session, or the null sentinel when none exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend fails or the blob is unreadable.
    async fn load(&self) -> Result<SessionRecord, PersistenceError>;

    /// Persist `record`, replacing any previous session.
    ///
    /// # Errors
    ///
    /// Returns an error when the record cannot be encoded or written.
    async fn store(&self, record: &SessionRecord) -> Result<(), PersistenceError>;
}

/// Synchronous string-keyed store, the shape of platform preference APIs.
pub trait KeyValueStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_string(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_string(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Error returned by [`MemoryStore`] when its lock was poisoned.
#[derive(Debug, Error)]
#[error("memory store lock poisoned")]
pub struct PoisonedStore;

/// Thread-safe in-memory [`KeyValueStore`]. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = PoisonedStore;

    fn get_string(&self, key: &str) -> Result<Option<String>, Self::Error> {
        let entries = self.entries.lock().map_err(|_| PoisonedStore)?;
        Ok(entries.get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let mut entries = self.entries.lock().map_err(|_| PoisonedStore)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let mut entries = self.entries.lock().map_err(|_| PoisonedStore)?;
        entries.remove(key);
        Ok(())
    }
}

/// [`SessionPersistence`] storing the record as JSON under one key.
#[derive(Debug, Clone)]
pub struct KeyValueSessionPersistence<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KeyValueSessionPersistence<S> {
    /// Persist under [`DEFAULT_SESSION_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn backend(&self) -> &S {
        &self.store
    }

    /// Delete the stored session so the next load yields the null sentinel.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.store
            .remove(&self.key)
            .map_err(|err| PersistenceError::backend(&self.key, err))
    }
}

#[async_trait]
impl<S: KeyValueStore> SessionPersistence for KeyValueSessionPersistence<S> {
    async fn load(&self) -> Result<SessionRecord, PersistenceError> {
        let blob = self
            .store
            .get_string(&self.key)
            .map_err(|err| PersistenceError::backend(&self.key, err))?;
        match blob {
            Some(json) if !json.trim().is_empty() => {
                let record = SessionRecord::from_json(&json)?;
                log::debug!(
                    "loaded session under {} (streak {}, day {})",
                    self.key,
                    record.game_streak(),
                    record.last_saved_day()
                );
                Ok(record)
            }
            _ => {
                log::debug!("no session stored under {}", self.key);
                Ok(SessionRecord::null())
            }
        }
    }

    async fn store(&self, record: &SessionRecord) -> Result<(), PersistenceError> {
        let json = record.to_json()?;
        self.store
            .set_string(&self.key, &json)
            .map_err(|err| PersistenceError::backend(&self.key, err))
    }
}
