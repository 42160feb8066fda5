use daystreak_core::KeyValueStore;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a key/value JSON object: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value store persisted as one JSON object on disk.
///
/// Every write rewrites the whole file through a temporary sibling so a
/// crash never leaves a half-written save behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, FileStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(FileStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| FileStoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), FileStoreError> {
        let io_err = |source| FileStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|source| {
            FileStoreError::Format {
                path: self.path.clone(),
                source,
            }
        })?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, json).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    type Error = FileStoreError;

    fn get_string(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}
