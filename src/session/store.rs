use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{ApiError, Result};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Key/value persistence for session tokens.
///
/// `set` and `remove` apply all their entries in one write, so callers can keep
/// related keys consistent.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove(&self, keys: &[&str]) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = lock(&self.values)?;
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut values = lock(&self.values)?;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

/// JSON file on disk, the CLI's stand-in for browser local storage
pub struct FileTokenStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store, reading existing tokens if the file exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let values = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring unreadable token file {}: {}", path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(ApiError::Storage(e.to_string())),
        };

        debug!("Opened token store at {} ({} keys)", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if values.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ApiError::Storage(e.to_string())),
            };
        }

        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json).map_err(|e| ApiError::Storage(e.to_string()))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = lock(&self.values)?;
        let mut next = values.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.to_string());
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut values = lock(&self.values)?;
        let mut next = values.clone();
        for key in keys {
            next.remove(*key);
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ApiError::Storage("token store lock poisoned".to_string()))
}
