use std::fmt::{self, Display};

use rcpt_dynamo_common::{
    Connection, Recipient, ResultRecord, Signal, TransportError, plugin,
};

use crate::{
    PLUGIN,
    lookup::{LookupClient, LookupOutcome},
};

pub const ADDRESS_FOUND: &str = "address-found";
pub const ADDRESS_NOT_FOUND: &str = "address-not-found";

/// Why the gate handed a recipient on instead of accepting it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Deferral {
    /// The key is not in the table; a later stage decides
    NotFound,
    /// The store could not be queried; fail open
    LookupFailed(TransportError),
    /// The command carried no recipient to look up
    MissingAddress,
}

/// What the gate decided for one recipient
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Defer(Deferral),
}

impl Decision {
    /// The signal handed back to the pipeline. Only an accept is explicit;
    /// every deferral just continues.
    pub const fn signal(&self) -> Signal {
        match self {
            Self::Accept => Signal::Accept,
            Self::Defer(_) => Signal::Continue,
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => f.write_str("accept"),
            Self::Defer(Deferral::NotFound) => f.write_str("defer (not found)"),
            Self::Defer(Deferral::LookupFailed(err)) => write!(f, "defer (lookup failed: {err})"),
            Self::Defer(Deferral::MissingAddress) => f.write_str("defer (no address)"),
        }
    }
}

/// Recipient existence gate
///
/// Accepts a recipient when its lowercased address exists as a key in the
/// configured table. Absent keys and lookup failures both defer to the next
/// stage rather than rejecting, so an outage never bounces mail by itself.
#[derive(Clone, Debug)]
pub struct RcptDynamo {
    client: LookupClient,
}

impl RcptDynamo {
    pub const fn new(client: LookupClient) -> Self {
        Self { client }
    }

    /// Handle one `RCPT TO` command
    ///
    /// Returns `None` without doing anything when the session has no
    /// transaction. Otherwise exactly one decision is returned and, if a
    /// lookup was made, exactly one result is added to the transaction.
    pub async fn rcpt(&self, connection: &Connection, params: &[Recipient]) -> Option<Decision> {
        // Hold on to the transaction in case the session drops it mid-lookup
        let transaction = connection.transaction()?;

        let Some(recipient) = params.first() else {
            plugin!(
                level = WARN,
                connection,
                PLUGIN,
                "No recipient given, deferring"
            );
            return Some(Decision::Defer(Deferral::MissingAddress));
        };

        let address = recipient.address().to_lowercase();
        plugin!(
            level = DEBUG,
            connection,
            PLUGIN,
            address = address.as_str(),
            "Checking dynamo for '{address}'"
        );

        let decision = match self.client.lookup(&address).await {
            LookupOutcome::Found => {
                plugin!(
                    level = INFO,
                    connection,
                    PLUGIN,
                    address = address.as_str(),
                    "Accepting rcpt found in dynamo: '{address}'"
                );
                transaction
                    .results
                    .add(PLUGIN, ResultRecord::Pass(ADDRESS_FOUND.to_string()));
                Decision::Accept
            }
            LookupOutcome::NotFound => {
                plugin!(
                    level = INFO,
                    connection,
                    PLUGIN,
                    address = address.as_str(),
                    "Rejecting rcpt not found in dynamo: '{address}'"
                );
                transaction
                    .results
                    .add(PLUGIN, ResultRecord::Fail(ADDRESS_NOT_FOUND.to_string()));
                Decision::Defer(Deferral::NotFound)
            }
            LookupOutcome::TransportError(err) => {
                plugin!(
                    level = ERROR,
                    connection,
                    PLUGIN,
                    address = address.as_str(),
                    "Rejecting rcpt '{address}', dynamo query error: '{err}'"
                );
                transaction
                    .results
                    .add(PLUGIN, ResultRecord::Error(err.to_string()));
                Decision::Defer(Deferral::LookupFailed(err))
            }
        };

        Some(decision)
    }
}
