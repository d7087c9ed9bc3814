//! Test helpers shared across Eisenhower crates.

pub mod clock;
pub mod fixtures;
pub mod store;
pub mod transport;

pub use clock::FixedClock;
pub use fixtures::{JIRA_ISSUE, JIRA_URL, OWA_INBOX, OWA_URL, jira_issue, owa_inbox};
pub use store::FailingStore;
pub use transport::FlakyTransport;
