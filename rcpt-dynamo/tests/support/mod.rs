#![allow(dead_code)]

use std::{
    io::{self, Write},
    sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use rcpt_dynamo::{
    GetItem, Item, KeyValueStore, LookupClient, RcptDynamo,
    config::{GateConfig, Settings},
    lookup::memory::MemoryStore,
};
use rcpt_dynamo_common::{Recipient, TransportError};
use tokio::sync::Notify;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const TABLE: &str = "mailboxes";
pub const HASH_KEY: &str = "address";

pub fn settings() -> Settings {
    [
        ("rcpt-dynamo.table-name", TABLE),
        ("rcpt-dynamo.hash-key-name", HASH_KEY),
    ]
    .into_iter()
    .collect()
}

pub fn config() -> GateConfig {
    GateConfig {
        table_name: Arc::from(TABLE),
        hash_key_name: Arc::from(HASH_KEY),
    }
}

pub fn gate(store: Arc<dyn KeyValueStore>) -> RcptDynamo {
    RcptDynamo::new(LookupClient::new(store, &config()))
}

pub fn params(address: &str) -> Vec<Recipient> {
    vec![Recipient::new(address)]
}

/// Formatted log output, captured for the current thread only
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's events here until the guard is dropped
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .finish();

        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Lines logged at `level` (e.g. `"INFO"`)
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == level))
            .map(str::to_string)
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A store that parks every read until released, so tests can act while a
/// lookup is in flight
#[derive(Default)]
pub struct PausedStore {
    pub inner: MemoryStore,
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl KeyValueStore for PausedStore {
    async fn get(&self, request: &GetItem) -> Result<Option<Item>, TransportError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.get(request).await
    }
}
