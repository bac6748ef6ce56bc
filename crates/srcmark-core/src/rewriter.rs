//! Deferred, offset-keyed rewriting of one source file.
//!
//! [`EditBuffer`] records insertions against byte offsets of the *original*
//! source and produces the rewritten text in a single final pass. The source
//! is never spliced while edits are being recorded, so an offset computed at
//! any point of a traversal stays valid no matter how many insertions were
//! recorded before or after it.
//!
//! # Ordering
//!
//! Output is produced offset by offset in ascending order. At one offset:
//!
//! 1. every [`Placement::Before`] edit, in insertion order
//! 2. every [`Placement::After`] edit, in insertion order
//!
//! Insertions do not consume source bytes; the original text resumes right
//! after the last insertion at an offset.
//!
//! # Example
//!
//! ```
//! use srcmark_core::patch::Placement;
//! use srcmark_core::rewriter::EditBuffer;
//!
//! let mut buffer = EditBuffer::new("a(b)");
//! buffer.insert(2, "<", Placement::Before).unwrap();
//! buffer.insert(3, ">", Placement::After).unwrap();
//! buffer.insert(2, "[", Placement::Before).unwrap();
//!
//! assert_eq!(buffer.materialize(), "a(<[b>)");
//! ```

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use crate::patch::{PendingEdit, Placement};

/// Errors from recording an edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Offset is past the end of the source.
    #[error("offset {offset} is out of range for source of length {len}")]
    OutOfRangeOffset { offset: usize, len: usize },

    /// Offset falls inside a multi-byte UTF-8 sequence.
    #[error("offset {offset} splits a UTF-8 character")]
    SplitsCharacter { offset: usize },
}

/// Result type for rewriter operations.
pub type RewriteResult<T> = Result<T, RewriteError>;

/// Insertions recorded at one offset, grouped by placement.
#[derive(Debug, Default, Clone)]
struct OffsetSlot {
    before: Vec<String>,
    after: Vec<String>,
}

impl OffsetSlot {
    fn texts(&self) -> impl Iterator<Item = (Placement, &str)> {
        self.before
            .iter()
            .map(|t| (Placement::Before, t.as_str()))
            .chain(self.after.iter().map(|t| (Placement::After, t.as_str())))
    }

    fn count(&self) -> usize {
        self.before.len() + self.after.len()
    }
}

/// Pending insertions against one immutable source text.
///
/// One buffer belongs to one file. It is filled during a traversal and read
/// once by [`materialize`](EditBuffer::materialize); reading does not clear it.
#[derive(Debug, Clone)]
pub struct EditBuffer<'src> {
    source: &'src str,
    slots: BTreeMap<usize, OffsetSlot>,
    count: usize,
}

impl<'src> EditBuffer<'src> {
    /// Create an empty buffer over `source`.
    pub fn new(source: &'src str) -> Self {
        EditBuffer {
            source,
            slots: BTreeMap::new(),
            count: 0,
        }
    }

    /// The original source text. Never modified.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Record an insertion of `text` at `offset`.
    ///
    /// Existing edits are kept; several edits may share an offset.
    pub fn insert(
        &mut self,
        offset: usize,
        text: impl Into<String>,
        placement: Placement,
    ) -> RewriteResult<()> {
        self.check_offset(offset)?;
        let text = text.into();
        trace!(offset, %placement, len = text.len(), "record insertion");

        let slot = self.slots.entry(offset).or_default();
        match placement {
            Placement::Before => slot.before.push(text),
            Placement::After => slot.after.push(text),
        }
        self.count += 1;
        Ok(())
    }

    /// Record a [`PendingEdit`].
    pub fn push(&mut self, edit: PendingEdit) -> RewriteResult<()> {
        self.insert(edit.offset, edit.text, edit.placement)
    }

    /// Validate that `offset` can receive an insertion.
    pub fn check_offset(&self, offset: usize) -> RewriteResult<()> {
        if offset > self.source.len() {
            return Err(RewriteError::OutOfRangeOffset {
                offset,
                len: self.source.len(),
            });
        }
        if !self.source.is_char_boundary(offset) {
            return Err(RewriteError::SplitsCharacter { offset });
        }
        Ok(())
    }

    /// All recorded edits, in the order `materialize` emits them.
    pub fn edits(&self) -> impl Iterator<Item = PendingEdit> + '_ {
        self.slots.iter().flat_map(|(&offset, slot)| {
            slot.texts()
                .map(move |(placement, text)| PendingEdit::new(offset, text, placement))
        })
    }

    /// Number of bytes the recorded edits add to the source.
    pub fn inserted_len(&self) -> usize {
        self.slots
            .values()
            .flat_map(|slot| slot.texts())
            .map(|(_, text)| text.len())
            .sum()
    }

    /// Produce the rewritten text.
    ///
    /// Offsets are interpreted against the original source. Repeated calls
    /// return identical text.
    pub fn materialize(&self) -> String {
        let mut out = String::with_capacity(self.source.len() + self.inserted_len());
        let mut cursor = 0usize;

        for (&offset, slot) in &self.slots {
            // Offsets were validated on insert
            out.push_str(&self.source[cursor..offset]);
            for (_, text) in slot.texts() {
                out.push_str(text);
            }
            cursor = offset;
            trace!(offset, edits = slot.count(), "materialized offset");
        }

        out.push_str(&self.source[cursor..]);
        out
    }
}
