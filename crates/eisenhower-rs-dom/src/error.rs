//! Error types for the document model.

use thiserror::Error;

/// Errors raised by document mutations and snapshot loading.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("unknown node #{0}")]
    UnknownNode(usize),
    #[error("node #{0} is not an element")]
    NotAnElement(usize),
    #[error("node #{0} cannot have children")]
    NotAContainer(usize),
    #[error("node #{node} is an ancestor of #{parent}")]
    HierarchyCycle { node: usize, parent: usize },
    #[error("node #{0} has no parent")]
    Detached(usize),
    #[error("invalid document url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Errors raised while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector at offset {0}")]
    Empty(usize),
    #[error("unexpected '{ch}' at offset {pos}")]
    Unexpected { ch: char, pos: usize },
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    #[error("unsupported pseudo-class :{0}")]
    UnsupportedPseudo(String),
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
}
