//! Client-local persistent key/value store.
//!
//! A single JSON object on disk holding a handful of scalar preferences.
//! Values that fail to read or decode are treated as absent; the store never
//! refuses to open.

use nuwa_common_core::Language;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Well-known store keys.
pub mod keys {
    /// Preferred UI language code.
    pub const LANGUAGE: &str = "language";
    /// Number of recorded page views.
    pub const PAGE_VIEWS: &str = "page_views";
}

/// Store errors. Only writes can fail.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON-file backed preference store.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl LocalStore {
    /// Open the store at `path`, starting empty if the file is missing or unreadable.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "local store is corrupt, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "local store unreadable, starting empty");
                Map::new()
            }
        };

        Self { path, values }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed value for a key; `None` when absent or of the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value and persist.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    /// Remove a value and persist. Returns the removed value.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, StoreError> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.flush()?;
        }
        Ok(removed)
    }

    /// Stored language preference.
    pub fn language(&self) -> Option<Language> {
        self.values
            .get(keys::LANGUAGE)
            .and_then(Value::as_str)
            .and_then(Language::parse)
    }

    /// Persist the language preference.
    pub fn set_language(&mut self, language: Language) -> Result<(), StoreError> {
        self.set(keys::LANGUAGE, language.code())
    }

    /// Recorded page views, zero when absent.
    pub fn page_views(&self) -> u64 {
        self.get_as(keys::PAGE_VIEWS).unwrap_or(0)
    }

    /// Increment and persist the page-view counter, returning the new count.
    pub fn increment_page_views(&mut self) -> Result<u64, StoreError> {
        let next = self.page_views().saturating_add(1);
        self.set(keys::PAGE_VIEWS, next)?;
        Ok(next)
    }

    // Whole-file rewrite through a temp file and rename.
    fn flush(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let contents = serde_json::to_string_pretty(&self.values).map_err(|source| {
            StoreError::Encode {
                key: String::new(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}
