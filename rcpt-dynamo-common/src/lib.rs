pub mod address;
pub mod context;
pub mod error;
pub mod logging;
pub mod signal;

pub use tracing;

pub use address::Recipient;
pub use context::{Connection, ResultRecord, Results, Transaction};
pub use error::{ParseError, TransportError};
pub use signal::Signal;
