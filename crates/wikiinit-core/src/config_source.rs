//! Configuration source abstraction
//!
//! A `ConfigSource` is a read-only, flat key/value view over some external
//! configuration store (properties file, YAML file, environment, ...).
//! Keys are dotted paths such as `wikiInitializer.initializeMainWiki`.
//!
//! Sources are expected to reflect the current state of the store on every
//! lookup: callers never cache values, so edits are picked up on next read.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::Result;

/// A raw configuration value.
///
/// Stores keep values either as a single string or as a list of strings.
/// Conversions between the two follow the properties-file convention where a
/// comma-separated scalar doubles as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(String),
    List(Vec<String>),
}

impl ConfigValue {
    /// Whether the value carries no usable content (blank string, empty list)
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(value) => value.trim().is_empty(),
            Self::List(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }

    /// Read the value as a single string; lists are joined with commas
    pub fn as_scalar(&self) -> String {
        match self {
            Self::Scalar(value) => value.trim().to_string(),
            Self::List(values) => values.join(","),
        }
    }

    /// Read the value as a list; scalars are split on commas
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::Scalar(value) => value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
            Self::List(values) => values.clone(),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Read-only configuration source
///
/// Implementations:
/// - `MemoryConfigSource`: in-memory map (embedding, tests)
/// - `FileConfigSource`: YAML / TOML / properties file (`wikiinit-config-file`)
/// - `EnvConfigSource`: environment variable overrides (`wikiinit-config-file`)
/// - `LayeredConfigSource`: ordered stack of sources (`wikiinit-config-file`)
pub trait ConfigSource: Send + Sync {
    /// Look up the raw value stored under `key`
    ///
    /// # Returns
    /// `Ok(None)` when the key is not present.
    ///
    /// # Errors
    /// - `Error::Io` / `Error::Config` when the underlying store can't be read
    fn get_property(&self, key: &str) -> Result<Option<ConfigValue>>;

    /// Name of the source, used in log messages
    fn name(&self) -> &str {
        "config"
    }
}

/// In-memory configuration source
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion
    pub fn with(self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set or replace the value of a key
    pub fn set(&self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value.into());
    }

    /// Remove a key
    pub fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}

impl ConfigSource for MemoryConfigSource {
    fn get_property(&self, key: &str) -> Result<Option<ConfigValue>> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
