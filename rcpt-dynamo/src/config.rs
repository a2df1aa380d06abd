//! Configuration binding for the gate.
//!
//! The gate needs exactly two settings, both namespaced under the plugin
//! identity: the table to read from and the name of its hash key. They can
//! come from any [`ConfigSource`]; the binary layers the environment over the
//! `settings` map of its RON file.
//!
//! ```ron
//! RcptDynamo(
//!     settings: {
//!         "rcpt-dynamo.table-name": "mailboxes",
//!         "rcpt-dynamo.hash-key-name": "address",
//!     },
//!     store: DynamoDb(
//!         region: Some("eu-west-1"),
//!     ),
//! )
//! ```

use std::{collections::HashMap, path::Path, sync::Arc};

use rcpt_dynamo_common::internal;
use serde::Deserialize;

use crate::{
    PLUGIN,
    error::ConfigError,
    lookup::{KeyValueStore, dynamo::DynamoStore, memory::MemoryStore},
};

pub const TABLE_NAME: &str = "table-name";
pub const HASH_KEY_NAME: &str = "hash-key-name";

/// Somewhere settings can be read from
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// A flat map of fully qualified keys to values
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Settings(HashMap<String, String>);

impl ConfigSource for Settings {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Process environment, with keys mapped to `SHOUTY_SNAKE_CASE`
///
/// `rcpt-dynamo.table-name` is read from `RCPT_DYNAMO_TABLE_NAME`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Env;

impl Env {
    pub fn variable(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl ConfigSource for Env {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(Self::variable(key)).ok()
    }
}

/// Several sources, consulted in order; the first non-empty value wins
#[derive(Default)]
pub struct Layered(Vec<Box<dyn ConfigSource>>);

impl Layered {
    #[must_use]
    pub fn with(mut self, source: impl ConfigSource + 'static) -> Self {
        self.0.push(Box::new(source));
        self
    }
}

impl ConfigSource for Layered {
    fn get(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .filter_map(|source| source.get(key))
            .find(|value| !value.trim().is_empty())
    }
}

/// The two settings the gate runs with, resolved once at start-up
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateConfig {
    pub table_name: Arc<str>,
    pub hash_key_name: Arc<str>,
}

fn required(source: &dyn ConfigSource, name: &str) -> Result<Arc<str>, ConfigError> {
    let key = format!("{PLUGIN}.{name}");
    match source.get(&key) {
        Some(value) if !value.trim().is_empty() => Ok(Arc::from(value.trim())),
        _ => Err(ConfigError::Missing(key)),
    }
}

impl GateConfig {
    /// Resolve both settings from `source`
    ///
    /// # Errors
    /// [`ConfigError::Missing`] naming the first of `rcpt-dynamo.table-name`
    /// or `rcpt-dynamo.hash-key-name` that is absent or blank.
    pub fn bind(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let table_name = required(source, TABLE_NAME)?;
        let hash_key_name = required(source, HASH_KEY_NAME)?;

        internal!(
            level = DEBUG,
            "Bound {PLUGIN}: table '{table_name}', hash key '{hash_key_name}'"
        );

        Ok(Self {
            table_name,
            hash_key_name,
        })
    }
}

/// Which store the gate reads from
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum StoreConfig {
    /// DynamoDB through the standard AWS provider chain. `region` and
    /// `endpoint_url` override what the environment would otherwise provide.
    DynamoDb {
        #[serde(default)]
        region: Option<String>,
        #[serde(default)]
        endpoint_url: Option<String>,
    },
    /// A fixed set of keys held in memory, for dry runs
    Memory {
        #[serde(default)]
        keys: Vec<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::DynamoDb {
            region: None,
            endpoint_url: None,
        }
    }
}

impl StoreConfig {
    /// Construct the configured store client
    pub async fn connect(&self) -> Arc<dyn KeyValueStore> {
        match self {
            Self::DynamoDb {
                region,
                endpoint_url,
            } => Arc::new(DynamoStore::connect(region.clone(), endpoint_url.clone()).await),
            Self::Memory { keys } => Arc::new(MemoryStore::with_keys(keys.iter().cloned())),
        }
    }
}

/// Root of the RON configuration file
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename = "RcptDynamo")]
pub struct FileConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub store: StoreConfig,
}

impl FileConfig {
    /// Parse a configuration from RON text
    ///
    /// # Errors
    /// If the text is not a valid configuration
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    /// Read and parse the configuration file at `path`
    ///
    /// # Errors
    /// If the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }
}
