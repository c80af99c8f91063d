//! Advisory "already claimed" flag kept on the claimer's side.
//!
//! Clearing the store resets it, so it only saves honest users a wasted
//! transaction. Store failures are logged and read as "not claimed".

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use crate::common::write_file_atomic;
use crate::error::MarkerError;

pub const CLAIMED_KEY: &str = "airdrop_claimed";
const CLAIMED_VALUE: &str = "true";

/// String key/value storage, shaped like browser local storage.
pub trait MarkerStore {
    fn get(&self, key: &str) -> Result<Option<String>, MarkerError>;
    fn set(&self, key: &str, value: &str) -> Result<(), MarkerError>;
}

pub fn has_claimed_before(store: &dyn MarkerStore) -> bool {
    match store.get(CLAIMED_KEY) {
        Ok(value) => value.as_deref() == Some(CLAIMED_VALUE),
        Err(err) => {
            warn!(error = %err, "could not read claimed marker");
            false
        }
    }
}

/// Sets the claimed flag.
///
/// # Arguments
/// * `store` - Where the flag is kept
///
/// # Returns
/// `true` if the store accepted the write. A failed write is logged and
/// otherwise ignored.
pub fn mark_as_claimed(store: &dyn MarkerStore) -> bool {
    match store.set(CLAIMED_KEY, CLAIMED_VALUE) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "could not write claimed marker");
            false
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MarkerStore for MemoryMarkerStore {
    fn get(&self, key: &str) -> Result<Option<String>, MarkerError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MarkerError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores entries as a flat JSON object in a single file.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    pub const FILE_NAME: &'static str = "markers.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/markers.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, MarkerError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(MarkerError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&contents).map_err(|source| MarkerError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }
}

impl MarkerStore for FileMarkerStore {
    fn get(&self, key: &str) -> Result<Option<String>, MarkerError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MarkerError> {
        // a corrupt store is overwritten rather than blocking the mark
        let mut entries = match self.read_all() {
            Err(MarkerError::Corrupt { .. }) => HashMap::new(),
            other => other?,
        };
        entries.insert(key.to_string(), value.to_string());

        let io_err = |source| MarkerError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(&entries).map_err(|source| {
            MarkerError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        write_file_atomic(&self.path, &contents).map_err(io_err)
    }
}
