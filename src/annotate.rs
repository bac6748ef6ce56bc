//! Annotation entry point: walk a tree, record markers, materialize.
//!
//! [`annotate`] is the one call that ties the pieces together. It owns a
//! fresh [`AnnotationContext`] for the duration of the walk, so the edit
//! buffer is created empty, filled by the handlers in the dispatch table and
//! read exactly once. If any handler fails the buffer is dropped with the
//! error and no text is produced.

use thiserror::Error;
use tracing::debug;

use srcmark_core::patch::PendingEdit;
use srcmark_core::rewriter::RewriteError;
use srcmark_cst::lexer::LexError;
use srcmark_cst::nodes::{NodeKind, SyntaxNode};
use srcmark_cst::visitor::{traverse, DispatchTable, TraversalStats};

use crate::config::MarkerSet;
use crate::policy::AnnotationContext;

/// Errors that abort annotation of a file.
///
/// Every variant names the offset that could not be used and the kind of the
/// node it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotateError {
    /// An insertion offset lies past the end of the source.
    #[error("offset {offset} of {kind} node is out of range for source of length {len}")]
    OutOfRangeOffset {
        offset: usize,
        len: usize,
        kind: NodeKind,
    },

    /// An insertion offset falls inside a multi-byte character.
    #[error("offset {offset} of {kind} node splits a UTF-8 character")]
    SplitsCharacter { offset: usize, kind: NodeKind },

    /// No token starts at a node's end marker.
    #[error("no token starts at end marker {offset} of {kind} node")]
    UnlexableBoundary { offset: usize, kind: NodeKind },
}

impl AnnotateError {
    /// The offending offset.
    pub fn offset(&self) -> usize {
        match self {
            AnnotateError::OutOfRangeOffset { offset, .. }
            | AnnotateError::SplitsCharacter { offset, .. }
            | AnnotateError::UnlexableBoundary { offset, .. } => *offset,
        }
    }

    /// Kind of the node the offset belongs to.
    pub fn kind(&self) -> NodeKind {
        match self {
            AnnotateError::OutOfRangeOffset { kind, .. }
            | AnnotateError::SplitsCharacter { kind, .. }
            | AnnotateError::UnlexableBoundary { kind, .. } => *kind,
        }
    }

    pub(crate) fn from_rewrite(err: RewriteError, kind: NodeKind) -> Self {
        match err {
            RewriteError::OutOfRangeOffset { offset, len } => {
                AnnotateError::OutOfRangeOffset { offset, len, kind }
            }
            RewriteError::SplitsCharacter { offset } => {
                AnnotateError::SplitsCharacter { offset, kind }
            }
        }
    }

    pub(crate) fn from_lex(err: LexError, kind: NodeKind) -> Self {
        match err {
            LexError::OutOfRange { offset, len } => {
                AnnotateError::OutOfRangeOffset { offset, len, kind }
            }
            LexError::Unlexable { offset, .. } => AnnotateError::UnlexableBoundary { offset, kind },
        }
    }
}

/// Result of annotating one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// The source with every marker inserted.
    pub text: String,
    /// Recorded markers, in the order they appear in `text`.
    pub edits: Vec<PendingEdit>,
    /// Walk counters.
    pub stats: TraversalStats,
}

impl Annotation {
    /// True if no marker was inserted; `text` then equals the source.
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Annotate `source`, whose syntax tree is rooted at `root`.
///
/// `table` decides which node kinds get markers (see
/// [`policy::dispatch_table`](crate::policy::dispatch_table)); `markers`
/// supplies the marker texts. An empty table yields the source unchanged.
pub fn annotate<'a>(
    source: &'a str,
    root: SyntaxNode<'_>,
    table: &DispatchTable<AnnotationContext<'a>, AnnotateError>,
    markers: &'a MarkerSet,
) -> Result<Annotation, AnnotateError> {
    let mut context = AnnotationContext::new(source, markers);
    let stats = traverse(root, table, &mut context)?;

    let buffer = context.into_buffer();
    let text = buffer.materialize();
    let edits: Vec<PendingEdit> = buffer.edits().collect();
    debug!(
        visited = stats.visited,
        dispatched = stats.dispatched,
        edits = edits.len(),
        "annotation complete"
    );

    Ok(Annotation { text, edits, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{dispatch_table, Rule};
    use srcmark_cst::nodes::{Field, FunctionSignature, NodeDetail, SyntaxTree, TreeBuilder};

    /// `int f() { return 1; }`
    fn function_tree() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        let unit = b.node(NodeKind::TranslationUnit, 0, 20);
        let func = b.node(NodeKind::FunctionDecl, 0, 20);
        let body = b.node(NodeKind::CompoundStatement, 8, 20);
        let ret = b.node(NodeKind::ReturnStatement, 10, 18);
        b.attach(unit, None, func).unwrap();
        b.attach(func, Some(Field::Body), body).unwrap();
        b.attach(body, None, ret).unwrap();
        b.set_detail(
            func,
            NodeDetail::Function(FunctionSignature {
                name: "f".to_string(),
                return_type: "int".to_string(),
            }),
        )
        .unwrap();
        b.finish(unit).unwrap()
    }

    #[test]
    fn empty_table_is_noop() {
        let source = "int f() { return 1; }";
        let tree = function_tree();
        let markers = MarkerSet::default();
        let table = dispatch_table(&[]);
        let result = annotate(source, tree.root(), &table, &markers).unwrap();
        assert_eq!(result.text, source);
        assert!(result.is_unchanged());
        assert_eq!(result.stats.visited, 4);
        assert_eq!(result.stats.dispatched, 0);
    }

    #[test]
    fn function_markers_wrap_definition() {
        let source = "int f() { return 1; }";
        let tree = function_tree();
        let markers = MarkerSet::default();
        let table = dispatch_table(&[Rule::Function]);
        let result = annotate(source, tree.root(), &table, &markers).unwrap();
        assert_eq!(
            result.text,
            "// Begin function f returning int\nint f() { return 1; }\n// End function f"
        );
        assert_eq!(result.edits.len(), 2);
        assert_eq!(result.edits[1].offset, source.len());
    }

    #[test]
    fn error_carries_offset_and_kind() {
        let err = AnnotateError::from_lex(
            LexError::Unlexable {
                offset: 7,
                found: ' ',
            },
            NodeKind::CompoundStatement,
        );
        assert_eq!(err.offset(), 7);
        assert_eq!(err.kind(), NodeKind::CompoundStatement);
        assert_eq!(
            err.to_string(),
            "no token starts at end marker 7 of compound_statement node"
        );
    }

    #[test]
    fn rewrite_error_maps_to_same_offset() {
        let err = AnnotateError::from_rewrite(
            RewriteError::OutOfRangeOffset { offset: 30, len: 21 },
            NodeKind::FunctionDecl,
        );
        assert_eq!(
            err,
            AnnotateError::OutOfRangeOffset {
                offset: 30,
                len: 21,
                kind: NodeKind::FunctionDecl
            }
        );
    }
}
