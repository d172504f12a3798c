//! Storage abstraction and the configuration store built on it.

use thiserror::Error;
use tracing::{info, warn};

/// # Errors produced by configuration storage backends.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing location does not exist or cannot be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing location failed.
    #[error("storage i/o failed")]
    Io(#[from] std::io::Error),

    /// The stored document could not be parsed.
    #[error("storage content malformed")]
    Malformed(#[from] serde_json::Error),
}

impl StorageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "storage_unavailable",
            StorageError::Io(_) => "storage_io",
            StorageError::Malformed(_) => "storage_malformed",
        }
    }
}

/// Flat string-keyed settings backend.
///
/// Implementations own the in-memory map and its persistence format;
/// [`ConfigStore`] only orchestrates. `get`/`set` operate on the in-memory
/// state and never touch the backing location; `load`/`save` do.
pub trait Storage: Send {
    /// Replaces the in-memory state with the content at `location`.
    fn load(&mut self, location: &str) -> Result<(), StorageError>;

    /// Persists the in-memory state to `location`.
    fn save(&self, location: &str) -> Result<(), StorageError>;

    /// Looks up a value; `None` when the key is absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Inserts or replaces a value.
    fn set(&mut self, key: &str, value: &str);
}

/// Application settings around the bus, owned explicitly by the caller.
///
/// Constructed once at startup with a concrete [`Storage`] backend and passed
/// by reference to whatever needs settings. There is no global instance.
pub struct ConfigStore {
    storage: Box<dyn Storage>,
}

impl ConfigStore {
    /// Wraps a storage backend.
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Loads settings from `location`, replacing the in-memory state.
    pub fn load(&mut self, location: &str) -> Result<(), StorageError> {
        self.storage.load(location)?;
        info!(target: "config", location, "configuration loaded");
        Ok(())
    }

    /// Persists the in-memory settings to `location`.
    pub fn save(&self, location: &str) -> Result<(), StorageError> {
        self.storage.save(location)?;
        info!(target: "config", location, "configuration saved");
        Ok(())
    }

    /// Looks up a setting; `None` when absent.
    pub fn get(&self, key: &str) -> Option<String> {
        self.storage.get(key)
    }

    /// Looks up a setting and parses it; falls back to `default` when the key
    /// is absent or the value does not parse.
    pub fn get_or<T>(&self, key: &str, default: T) -> T
    where
        T: std::str::FromStr,
    {
        match self.storage.get(key) {
            Some(raw) => match raw.parse() {
                Ok(value) => value,
                Err(_) => {
                    warn!(target: "config", key, value = %raw, "unparsable setting, using default");
                    default
                }
            },
            None => default,
        }
    }

    /// Inserts or replaces a setting in memory; call [`save`](Self::save) to
    /// persist.
    pub fn set(&mut self, key: &str, value: &str) {
        self.storage.set(key, value);
    }
}
