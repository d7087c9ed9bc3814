//! Error types for the Eisenhower core.

use crate::coordination::TransportError;
use eisenhower_rs_config::ConfigError;
use eisenhower_rs_dom::{DomError, SelectorError};
use eisenhower_rs_store::StoreError;
use thiserror::Error;

/// Errors surfaced by core components.
#[derive(Debug, Error)]
pub enum EisenhowerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("document error: {0}")]
    Dom(#[from] DomError),
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },
    #[error("invalid rating: {0}")]
    InvalidRating(String),
}
