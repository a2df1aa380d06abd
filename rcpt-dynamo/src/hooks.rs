use std::{
    fmt::{self, Display},
    sync::Arc,
};

use async_trait::async_trait;
use rcpt_dynamo_common::{Connection, Recipient, Signal, internal};
use serde::Deserialize;

use crate::{
    PLUGIN,
    config::{ConfigSource, GateConfig},
    error::ConfigError,
    gate::RcptDynamo,
    lookup::{KeyValueStore, LookupClient},
};

/// Points in an SMTP session a hook can be bound to
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Deserialize)]
pub enum Event {
    Connect,
    Helo,
    MailFrom,
    RcptTo,
    Data,
}

/// A handler bound to an [`Event`]
///
/// `params` are the parsed parameters of the command that triggered the
/// event. Returning `None` means the hook did nothing and the pipeline
/// should not be resumed on its behalf.
#[async_trait]
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(
        &self,
        event: Event,
        connection: &Connection,
        params: &[Recipient],
    ) -> Option<Signal>;
}

/// The gate only has something to check on [`Event::RcptTo`]. Bound to any
/// other event it makes no lookup, writes no record and lets the chain go on.
#[async_trait]
impl Hook for RcptDynamo {
    fn name(&self) -> &str {
        PLUGIN
    }

    async fn handle(
        &self,
        event: Event,
        connection: &Connection,
        params: &[Recipient],
    ) -> Option<Signal> {
        match event {
            Event::RcptTo => self
                .rcpt(connection, params)
                .await
                .map(|decision| decision.signal()),
            Event::Connect | Event::Helo | Event::MailFrom | Event::Data => Some(Signal::Continue),
        }
    }
}

struct Binding {
    event: Event,
    hook: Arc<dyn Hook>,
}

impl Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.hook.name(), self.event)
    }
}

/// Hooks bound to session events, run in the order they were registered
#[derive(Default)]
pub struct Registry {
    bindings: Vec<Binding>,
}

impl Registry {
    pub fn register_hook(&mut self, event: Event, hook: Arc<dyn Hook>) {
        let binding = Binding { event, hook };
        internal!(level = INFO, "Registered hook: {binding}");
        self.bindings.push(binding);
    }

    /// Hooks bound to `event`, in registration order
    pub fn hooks(&self, event: Event) -> impl Iterator<Item = &Arc<dyn Hook>> {
        self.bindings
            .iter()
            .filter(move |binding| binding.event == event)
            .map(|binding| &binding.hook)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run the hooks bound to `event`
    ///
    /// The first hook to accept ends the chain with [`Signal::Accept`]. A hook
    /// that does nothing ends it with `None`. If every hook continues, so
    /// does the pipeline.
    pub async fn dispatch(
        &self,
        event: Event,
        connection: &Connection,
        params: &[Recipient],
    ) -> Option<Signal> {
        internal!("Dispatching: {event:?}");

        for hook in self.hooks(event) {
            let signal = hook.handle(event, connection, params).await?;
            internal!(level = DEBUG, "{}: {signal}", hook.name());

            if signal.is_accept() {
                return Some(Signal::Accept);
            }
        }

        Some(Signal::Continue)
    }

    /// Run the hooks bound to `event`, then hand the outcome to `next`
    ///
    /// `next` is called at most once, and not at all if a hook did nothing.
    pub async fn dispatch_with<F>(
        &self,
        event: Event,
        connection: &Connection,
        params: &[Recipient],
        next: F,
    ) where
        F: FnOnce(Signal) + Send,
    {
        if let Some(signal) = self.dispatch(event, connection, params).await {
            next(signal);
        }
    }
}

/// Bind configuration and register the gate for `RCPT TO`
///
/// Nothing is registered unless both settings resolve.
///
/// # Errors
/// [`ConfigError::Missing`] naming the first absent setting.
pub fn register(
    source: &dyn ConfigSource,
    store: Arc<dyn KeyValueStore>,
    registry: &mut Registry,
) -> Result<Arc<RcptDynamo>, ConfigError> {
    let config = GateConfig::bind(source)?;
    let gate = Arc::new(RcptDynamo::new(LookupClient::new(store, &config)));

    registry.register_hook(Event::RcptTo, Arc::clone(&gate) as Arc<dyn Hook>);

    Ok(gate)
}
