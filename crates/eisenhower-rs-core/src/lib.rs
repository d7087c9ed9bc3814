//! Eisenhower core: resolve the item a user points at, classify it, persist it
//! and annotate the page.
//!
//! Data flows one way per operation: the [`resolver`] extracts an id and a
//! subject from a [`Document`](eisenhower_rs_dom::Document), the
//! [`classifier`] maps the ratings to a quadrant, the store persists the
//! record and the [`renderer`] updates the page. The [`coordination`] layer
//! wires these together behind request/response messages.

pub mod classifier;
pub mod clock;
pub mod coordination;
pub mod error;
pub mod renderer;
pub mod resolver;

pub use classifier::{Matrix, MatrixEntry, classify, display_subject};
pub use clock::{Clock, SystemClock};
pub use coordination::{
    Dispatcher, Envelope, LocalTransport, MenuItem, MenuOutcome, PageAgent, PageInbox,
    RetryPolicy, RetryingTransport, ScanScheduler, ScanState, Sweeper, Transport, TransportError,
    validate_ratings,
};
pub use error::EisenhowerError;
pub use renderer::{Palette, Renderer};
pub use resolver::{
    ItemLocator, PageResolver, ResolveMode, Resolution, Resolver, SubjectCleaner, Target, WebPage,
};
