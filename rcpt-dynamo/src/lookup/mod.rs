//! The lookup side of the gate: a single-key point read against a keyed
//! store, reduced to whether the key exists.

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use async_trait::async_trait;
use rcpt_dynamo_common::TransportError;
use tracing::instrument;

use crate::config::GateConfig;

pub mod dynamo;
pub mod memory;

/// One point read: `key_name = key` in `table_name`, projecting `projection`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GetItem {
    pub table_name: Arc<str>,
    pub key_name: Arc<str>,
    pub key: String,
    pub projection: Arc<str>,
}

/// The projected key attribute of an item that exists
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub key: String,
}

/// A remote keyed-lookup store
///
/// Implementations perform exactly one round-trip per call, with no retry,
/// and report every failure as a [`TransportError`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, request: &GetItem) -> Result<Option<Item>, TransportError>;
}

/// The three ways a lookup can end
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupOutcome {
    Found,
    NotFound,
    TransportError(TransportError),
}

impl Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found => f.write_str("found"),
            Self::NotFound => f.write_str("not found"),
            Self::TransportError(err) => write!(f, "transport error: {err}"),
        }
    }
}

impl From<Result<Option<Item>, TransportError>> for LookupOutcome {
    fn from(value: Result<Option<Item>, TransportError>) -> Self {
        match value {
            Ok(Some(_)) => Self::Found,
            Ok(None) => Self::NotFound,
            Err(err) => Self::TransportError(err),
        }
    }
}

/// Binds a store to the configured table and hash key
///
/// Cloning is cheap and every clone shares the same store client.
#[derive(Clone)]
pub struct LookupClient {
    store: Arc<dyn KeyValueStore>,
    table_name: Arc<str>,
    key_name: Arc<str>,
}

impl LookupClient {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &GateConfig) -> Self {
        Self {
            store,
            table_name: Arc::clone(&config.table_name),
            key_name: Arc::clone(&config.hash_key_name),
        }
    }

    /// The request that would be sent for `key`
    pub fn request(&self, key: impl Into<String>) -> GetItem {
        GetItem {
            table_name: Arc::clone(&self.table_name),
            key_name: Arc::clone(&self.key_name),
            key: key.into(),
            projection: Arc::clone(&self.key_name),
        }
    }

    /// Check whether `key` exists in the table
    #[instrument(level = "trace", skip(self), ret(Display))]
    pub async fn lookup(&self, key: &str) -> LookupOutcome {
        self.store.get(&self.request(key)).await.into()
    }
}

impl fmt::Debug for LookupClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupClient")
            .field("table_name", &self.table_name)
            .field("key_name", &self.key_name)
            .finish_non_exhaustive()
    }
}
