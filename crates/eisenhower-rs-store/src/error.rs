//! Error types for priority storage.

/// Errors returned by priority stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A namespace file exists but cannot be decoded.
    #[error("corrupt namespace {namespace}: {source}")]
    Corrupt {
        namespace: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Record rejected before it reached storage.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// Backend refused the operation (quota, policy).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
