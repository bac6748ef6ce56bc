//! Edit IR: placements and pending insertions.
//!
//! These are the value types the rewriter is built from:
//! - [`Placement`]: tie-break between edits that share an offset
//! - [`PendingEdit`]: one recorded insertion
//! - [`ContentHash`]: SHA-256 of file content, reported for inputs and outputs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentHash(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an insertion lands relative to the other insertions at its offset.
///
/// At a shared offset every `Before` edit is emitted ahead of every `After`
/// edit. Within one placement, edits keep the order they were inserted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Emitted ahead of the `After` group at the same offset.
    Before,
    /// Emitted behind the `Before` group at the same offset.
    After,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Before => write!(f, "before"),
            Placement::After => write!(f, "after"),
        }
    }
}

/// A text insertion keyed to an offset in the original source.
///
/// Edits never consume original bytes: materializing places `text` between
/// `source[..offset]` and `source[offset..]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEdit {
    /// Byte offset in the original source, in `[0, len]`.
    pub offset: usize,
    /// Text to insert.
    pub text: String,
    /// Tie-break against other edits at `offset`.
    pub placement: Placement,
}

impl PendingEdit {
    /// Create a new pending edit.
    pub fn new(offset: usize, text: impl Into<String>, placement: Placement) -> Self {
        PendingEdit {
            offset,
            text: text.into(),
            placement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod content_hash_tests {
        use super::*;

        #[test]
        fn content_hash_compute_produces_hex() {
            let hash = ContentHash::compute(b"hello");
            assert_eq!(hash.0.len(), 64);
            assert!(hash.0.chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn content_hash_differs_for_different_content() {
            assert_ne!(ContentHash::compute(b"a"), ContentHash::compute(b"b"));
            assert_eq!(ContentHash::compute(b"a"), ContentHash::compute(b"a"));
        }
    }

    #[test]
    fn placement_serializes_snake_case() {
        let json = serde_json::to_string(&Placement::Before).unwrap();
        assert_eq!(json, "\"before\"");
        assert_eq!(Placement::After.to_string(), "after");
    }

    #[test]
    fn pending_edit_serializes_placement() {
        let edit = PendingEdit::new(7, "x", Placement::After);
        let json = serde_json::to_value(&edit).unwrap();
        assert_eq!(json["offset"], 7);
        assert_eq!(json["placement"], "after");
    }
}
