//! Wiring between the background context, the page context and the store.
//!
//! The two contexts only talk through a [`Transport`]; everything a request
//! needs on the page side lives in the [`PageAgent`].

mod agent;
mod dispatcher;
mod scheduler;
mod sweeper;
mod transport;

pub use agent::PageAgent;
pub use dispatcher::{Dispatcher, MenuItem, MenuOutcome, validate_ratings};
pub use scheduler::{ScanScheduler, ScanState};
pub use sweeper::Sweeper;
pub use transport::{
    Envelope, LocalTransport, PageInbox, RetryPolicy, RetryingTransport, Transport, TransportError,
};
