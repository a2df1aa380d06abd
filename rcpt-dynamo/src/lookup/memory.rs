use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rcpt_dynamo_common::TransportError;

use super::{GetItem, Item, KeyValueStore};

/// In-memory key store
///
/// Holds a set of keys and answers point reads against it, ignoring the
/// table name. Every request is recorded so tests can check exactly what
/// was asked for, and the store can be told to fail every read until
/// [`MemoryStore::recover`] is called.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    keys: Arc<RwLock<HashSet<String>>>,
    requests: Arc<Mutex<Vec<GetItem>>>,
    failure: Arc<RwLock<Option<TransportError>>>,
}

impl MemoryStore {
    pub fn with_keys<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            keys: Arc::new(RwLock::new(keys.into_iter().map(Into::into).collect())),
            ..Default::default()
        }
    }

    pub fn insert(&self, key: impl Into<String>) {
        self.keys.write().insert(key.into());
    }

    pub fn remove(&self, key: &str) -> bool {
        self.keys.write().remove(key)
    }

    /// Fail every subsequent read with `error`
    pub fn fail_with(&self, error: TransportError) {
        *self.failure.write() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.write() = None;
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<GetItem> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, request: &GetItem) -> Result<Option<Item>, TransportError> {
        self.requests.lock().push(request.clone());

        if let Some(err) = self.failure.read().clone() {
            return Err(err);
        }

        Ok(self.keys.read().get(&request.key).map(|key| Item {
            key: key.clone(),
        }))
    }
}
