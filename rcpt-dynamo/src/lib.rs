//! A recipient admission gate for the `RCPT TO` stage of an SMTP session.
//!
//! For every recipient the gate performs a single point read against a keyed
//! store (DynamoDB in production) and either accepts the address outright,
//! or defers to the next stage when the key is absent or the store could not
//! be reached. Each decision is written to the transaction's result log.

pub mod config;
pub mod error;
pub mod gate;
pub mod hooks;
pub mod lookup;

pub use config::{ConfigSource, GateConfig};
pub use error::ConfigError;
pub use gate::{Decision, Deferral, RcptDynamo};
pub use hooks::{Event, Hook, Registry, register};
pub use lookup::{GetItem, Item, KeyValueStore, LookupClient, LookupOutcome};

/// Identity of this plugin: configuration namespace, log tag and result key
pub const PLUGIN: &str = "rcpt-dynamo";
