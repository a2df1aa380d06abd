use std::{
    fmt::{self, Display},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// One annotation a plugin leaves on a transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultRecord {
    Pass(String),
    Fail(String),
    Error(String),
}

impl Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(msg) => write!(f, "pass: {msg}"),
            Self::Fail(msg) => write!(f, "fail: {msg}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Append-only log of plugin annotations for a single transaction
///
/// Entries can only ever be added. Concurrent hooks on the same transaction
/// each append under a short lock, and readers get a copy.
#[derive(Debug, Default)]
pub struct Results {
    entries: Mutex<Vec<(String, ResultRecord)>>,
}

impl Results {
    pub fn add(&self, plugin: &str, record: ResultRecord) {
        self.entries.lock().push((plugin.to_string(), record));
    }

    /// Every record added by `plugin`, in the order they were added
    pub fn get(&self, plugin: &str) -> Vec<ResultRecord> {
        self.entries
            .lock()
            .iter()
            .filter(|(name, _)| name == plugin)
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<(String, ResultRecord)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Per-message state, from `MAIL FROM` until the message is queued or reset
#[derive(Debug)]
pub struct Transaction {
    id: String,
    pub results: Results,
}

impl Transaction {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            results: Results::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A client session as seen by hooks
///
/// The session owns its current transaction and may drop it at any time
/// (`RSET`, disconnect), including while a hook is still running. Hooks take
/// their own handle with [`Connection::transaction`] up front and keep
/// writing to that.
#[derive(Debug)]
pub struct Connection {
    id: String,
    transaction: RwLock<Option<Arc<Transaction>>>,
    transactions: AtomicUsize,
}

impl Connection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transaction: RwLock::default(),
            transactions: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The active transaction, if any
    pub fn transaction(&self) -> Option<Arc<Transaction>> {
        self.transaction.read().clone()
    }

    /// Start a new transaction, replacing any existing one
    pub fn begin_transaction(&self) -> Arc<Transaction> {
        let count = self.transactions.fetch_add(1, Ordering::Relaxed) + 1;
        let transaction = Arc::new(Transaction::new(format!("{}.{count}", self.id)));
        *self.transaction.write() = Some(Arc::clone(&transaction));
        transaction
    }

    /// Drop the active transaction, returning it if there was one
    pub fn reset_transaction(&self) -> Option<Arc<Transaction>> {
        self.transaction.write().take()
    }
}
