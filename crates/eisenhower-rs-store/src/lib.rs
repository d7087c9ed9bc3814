//! Priority persistence for Eisenhower.
//!
//! Records live in two independent namespaces (mail items keyed by
//! conversation id, web pages keyed by URL) next to a small settings
//! document. Every operation reports failure through [`StoreError`]; nothing
//! here panics on storage trouble.

mod error;
mod file;
mod memory;
mod observed;
mod provider;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use observed::{ObservedStore, StoreEvent};
pub use provider::{PriorityStore, remove_expired, validate_record};
