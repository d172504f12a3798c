//! JSON file storage backend.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use super::store::{Storage, StorageError};

/// Flat string map persisted as a single JSON object.
///
/// ### Notes
/// - String values are stored verbatim; any other JSON value (number, bool,
///   nested object) is kept as its serialized text, so `{"max_threads": 4}`
///   reads back as `"4"`.
/// - `load` requires the file to exist; callers that tolerate a missing
///   config file match on [`StorageError::Unavailable`].
#[derive(Debug, Default)]
pub struct JsonStorage {
    values: HashMap<String, String>,
}

impl JsonStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for JsonStorage {
    fn load(&mut self, location: &str) -> Result<(), StorageError> {
        if !Path::new(location).is_file() {
            return Err(StorageError::Unavailable(location.to_string()));
        }
        let text = fs::read_to_string(location)?;
        let doc: Value = serde_json::from_str(&text)?;

        self.values.clear();
        if let Value::Object(entries) = doc {
            for (key, value) in entries {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                self.values.insert(key, text);
            }
        }
        debug!(target: "config", location, entries = self.values.len(), "json storage loaded");
        Ok(())
    }

    fn save(&self, location: &str) -> Result<(), StorageError> {
        let mut doc = Map::new();
        for (key, value) in &self.values {
            doc.insert(key.clone(), Value::String(value.clone()));
        }
        let text = serde_json::to_string_pretty(&Value::Object(doc))?;
        fs::write(location, text)?;
        debug!(target: "config", location, entries = self.values.len(), "json storage saved");
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}
