//! Annotation policy: which nodes get markers, and where.
//!
//! Two rules are defined:
//!
//! - [`Rule::Conditional`]: each branch of an `if` statement is wrapped.
//!   The open marker goes before the branch's first token, the close marker
//!   right after its last token.
//! - [`Rule::Function`]: each function *definition* is wrapped. The open
//!   marker goes before the whole definition, the close marker one byte past
//!   the body's closing brace. Prototypes have no body and are skipped.
//!
//! Handlers only read the node and record edits in the context's buffer; the
//! walk itself lives in [`srcmark_cst::visitor`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use srcmark_core::patch::Placement;
use srcmark_core::rewriter::EditBuffer;
use srcmark_core::text::{indent_new_lines, line_indent};
use srcmark_cst::lexer::end_of_token;
use srcmark_cst::nodes::{Field, NodeKind, SyntaxNode};
use srcmark_cst::visitor::{DispatchTable, Handler};

use crate::annotate::AnnotateError;
use crate::config::MarkerSet;

/// State shared by the handlers during one walk.
#[derive(Debug)]
pub struct AnnotationContext<'a> {
    buffer: EditBuffer<'a>,
    markers: &'a MarkerSet,
}

impl<'a> AnnotationContext<'a> {
    /// Start annotating `source` with an empty buffer.
    pub fn new(source: &'a str, markers: &'a MarkerSet) -> Self {
        AnnotationContext {
            buffer: EditBuffer::new(source),
            markers,
        }
    }

    /// The original source text.
    pub fn source(&self) -> &'a str {
        self.buffer.source()
    }

    /// Marker texts in use.
    pub fn markers(&self) -> &'a MarkerSet {
        self.markers
    }

    /// Edits recorded so far.
    pub fn buffer(&self) -> &EditBuffer<'a> {
        &self.buffer
    }

    /// Finish the walk and hand over the buffer.
    pub fn into_buffer(self) -> EditBuffer<'a> {
        self.buffer
    }

    /// Record `text` at `offset`, attributing failures to `kind`.
    ///
    /// Newlines in `text` are followed by the indentation of the line holding
    /// `offset` unless the marker set turns that off.
    pub fn insert(
        &mut self,
        offset: usize,
        text: String,
        placement: Placement,
        kind: NodeKind,
    ) -> Result<(), AnnotateError> {
        let text = if self.markers.indent_new_lines && text.contains('\n') {
            indent_new_lines(&text, line_indent(self.source(), offset))
        } else {
            text
        };
        debug!(offset, %placement, %kind, "insert marker");
        self.buffer
            .insert(offset, text, placement)
            .map_err(|e| AnnotateError::from_rewrite(e, kind))
    }

    /// Offset just past the last token of `node`.
    pub fn token_end(&self, node: SyntaxNode<'_>) -> Result<usize, AnnotateError> {
        end_of_token(self.source(), node.end_marker())
            .map_err(|e| AnnotateError::from_lex(e, node.kind()))
    }

    /// Put `open` before the first token of `node` and `close` after its last.
    fn wrap(
        &mut self,
        node: SyntaxNode<'_>,
        open: String,
        close: String,
    ) -> Result<(), AnnotateError> {
        let end = self.token_end(node)?;
        self.insert(node.start(), open, Placement::Before, node.kind())?;
        self.insert(end, close, Placement::After, node.kind())
    }
}

/// A selectable annotation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    /// Wrap the branches of `if` statements.
    Conditional,
    /// Wrap function definitions.
    Function,
}

impl Rule {
    /// Every rule, in application order.
    pub const ALL: [Rule; 2] = [Rule::Conditional, Rule::Function];

    /// Node kind the rule dispatches on.
    pub fn kind(self) -> NodeKind {
        match self {
            Rule::Conditional => NodeKind::IfStatement,
            Rule::Function => NodeKind::FunctionDecl,
        }
    }

    /// Handler implementing the rule.
    pub fn handler<'a>(self) -> Handler<AnnotationContext<'a>, AnnotateError> {
        match self {
            Rule::Conditional => {
                annotate_conditional as Handler<AnnotationContext<'a>, AnnotateError>
            }
            Rule::Function => annotate_function as Handler<AnnotationContext<'a>, AnnotateError>,
        }
    }
}

/// Build the dispatch table for `rules`. An empty slice gives an empty table.
pub fn dispatch_table<'a>(rules: &[Rule]) -> DispatchTable<AnnotationContext<'a>, AnnotateError> {
    let mut table = DispatchTable::new();
    for rule in rules {
        table.register(rule.kind(), rule.handler());
    }
    table
}

/// Conditional handler: wraps the consequence and, if present, the
/// alternative of an `if` statement.
pub fn annotate_conditional(
    ctx: &mut AnnotationContext<'_>,
    node: SyntaxNode<'_>,
) -> Result<(), AnnotateError> {
    let markers = ctx.markers();
    if let Some(then) = node.child(Field::Consequence) {
        ctx.wrap(then, markers.if_open(), markers.if_close())?;
    }
    if let Some(other) = node.child(Field::Alternative) {
        ctx.wrap(other, markers.else_open(), markers.else_close())?;
    }
    Ok(())
}

/// Function handler: wraps a function definition. Declarations without a
/// body are left alone.
pub fn annotate_function(
    ctx: &mut AnnotationContext<'_>,
    node: SyntaxNode<'_>,
) -> Result<(), AnnotateError> {
    let Some(body) = node.child(Field::Body) else {
        trace!(start = node.start(), "function without body skipped");
        return Ok(());
    };

    let markers = ctx.markers();
    let signature = node.function_signature();
    // The body's last token is its closing brace
    let close_at = body.end_marker() + 1;

    ctx.insert(
        node.start(),
        markers.function_open(signature),
        Placement::Before,
        node.kind(),
    )?;
    ctx.insert(
        close_at,
        markers.function_close(signature),
        Placement::After,
        body.kind(),
    )
}
