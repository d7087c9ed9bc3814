//! Document model for mail and web page snapshots.
//!
//! The pages the resolver and renderer work on are owned by third parties and
//! change without notice, so every lookup here is total: absent structure is
//! reported as `None` or an empty match list, never as an error. Only
//! mutations on invalid node handles and malformed selectors fail.

mod document;
mod error;
mod html;
mod selector;
mod style;

pub use document::{Document, Element, NodeId};
pub use error::{DomError, SelectorError};
pub use selector::Selector;
