//! Durable client storage
//!
//! Small string key/value store that survives process restarts, used for the
//! session token and the recently viewed series list.
//!
//! Absent or malformed data is never an error for readers: `get` returns
//! `None` and callers fall back to their defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Storage key holding the API token
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the JSON-encoded recently viewed series list
pub const RECENT_SERIES_KEY: &str = "recentSeries";

/// Key/value storage shared by the HTTP client and the store modules
pub trait ClientStorage: Send + Sync {
    /// Read a value; `None` when the key is absent
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Delete a key only while it still holds `expected`
    ///
    /// Returns whether the key was removed. Implementations backed by a
    /// lock override this so the check and the removal are one step.
    fn remove_if_eq(&self, key: &str, expected: &str) -> Result<bool> {
        if self.get(key).as_deref() == Some(expected) {
            self.remove(key)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Read and decode a JSON value, treating malformed data as absent
pub fn get_json<T, S>(storage: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: ClientStorage + ?Sized,
{
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key = %key, error = %e, "Ignoring malformed stored value");
            None
        }
    }
}

/// Encode a value as JSON and store it
pub fn set_json<T, S>(storage: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: ClientStorage + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave the map half-written
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ========================================
// In-memory storage
// ========================================

/// Process-local storage; contents are lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with the given entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn remove_if_eq(&self, key: &str, expected: &str) -> Result<bool> {
        let mut entries = lock(&self.entries);
        if entries.get(key).map(String::as_str) == Some(expected) {
            entries.remove(key);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

// ========================================
// File-backed storage
// ========================================

/// Storage persisted as a single JSON object on disk
///
/// The file is read once when opened. Every write rewrites the whole file
/// through a temporary file and a rename, so a crash never leaves a torn
/// file behind. On unix the file is created with mode 0600 since it holds
/// the API token.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open storage at `path`
    ///
    /// A missing file opens as empty storage. A file that is not a JSON
    /// object of strings is logged and ignored; it is replaced on the next
    /// write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Storage file is malformed, starting empty"
                    );
                    BTreeMap::new()
                }
            }
        } else {
            debug!(path = %path.display(), "Storage file not found, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            Error::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = lock(&self.entries);
        self.update_locked(&mut entries, change)
    }

    fn update_locked<F>(&self, entries: &mut BTreeMap<String, String>, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut next = entries.clone();
        change(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if lock(&self.entries).contains_key(key) {
            self.update(|entries| {
                entries.remove(key);
            })
        } else {
            Ok(())
        }
    }

    fn remove_if_eq(&self, key: &str, expected: &str) -> Result<bool> {
        let mut entries = lock(&self.entries);
        if entries.get(key).map(String::as_str) != Some(expected) {
            return Ok(false);
        }
        self.update_locked(&mut entries, |next| {
            next.remove(key);
        })?;
        Ok(true)
    }
}
