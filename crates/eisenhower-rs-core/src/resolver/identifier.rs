//! Identifier derivation for located items.

use eisenhower_rs_dom::{Document, NodeId};
use sha2::{Digest, Sha256};

/// Attributes carrying an application assigned identifier, most stable first.
pub const ID_ATTRIBUTES: [&str; 4] = ["data-convid", "id", "data-id", "aria-posinset"];

/// Attributes an item can be looked up by when reopening it.
pub const LOOKUP_ATTRIBUTES: [&str; 3] = ["data-convid", "id", "data-id"];

const HASH_PREFIX_LEN: usize = 16;

/// First non-blank identifier attribute of `node`.
pub fn element_id(doc: &Document, node: NodeId) -> Option<String> {
    ID_ATTRIBUTES.iter().find_map(|name| {
        doc.attr(node, name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

/// Hex prefix of the SHA-256 of `text`.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_PREFIX_LEN);
    hex
}

/// Id for list items without any identifier attribute.
pub fn synthetic_id(subject: &str) -> String {
    format!("item_{}", content_hash(subject))
}

/// Id for items resolved from the reading pane.
pub fn reading_pane_id(subject: &str) -> String {
    format!("rp_{}", content_hash(subject))
}
