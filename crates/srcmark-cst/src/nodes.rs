// Copyright (c) srcmark contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Arena syntax tree.
//!
//! A [`SyntaxTree`] owns every node of one translation unit. Callers read it
//! through [`SyntaxNode`] handles, which are `Copy` and borrow the tree.
//!
//! # Offsets
//!
//! Each node carries two byte offsets into the source it was built from:
//!
//! - `start`: where the node's first token begins
//! - `end_marker`: where the node's *last token begins*
//!
//! The end marker does not point past the node. Finding the true end needs a
//! lexical lookup of the token at `end_marker`; see [`crate::lexer`].
//!
//! # Child order
//!
//! [`TreeBuilder::finish`] stably sorts every node's children by start
//! offset, so traversal order is source order whatever order the tree
//! provider attached them in.

use std::fmt::{self, Write as _};

use thiserror::Error;

/// Closed set of node kinds the tree format defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    TranslationUnit,
    /// Function definition, or a declaration of a function without a body.
    FunctionDecl,
    /// Any non-function declaration.
    Declaration,
    TypeDefinition,
    CompoundStatement,
    IfStatement,
    WhileStatement,
    DoStatement,
    ForStatement,
    SwitchStatement,
    CaseStatement,
    ReturnStatement,
    /// `break`, `continue` or `goto`.
    JumpStatement,
    LabeledStatement,
    ExpressionStatement,
    Expression,
    Other,
}

impl NodeKind {
    /// Number of kinds; dispatch tables are arrays of this length.
    pub const COUNT: usize = 17;

    /// Every kind, in declaration order.
    pub const ALL: [NodeKind; NodeKind::COUNT] = [
        NodeKind::TranslationUnit,
        NodeKind::FunctionDecl,
        NodeKind::Declaration,
        NodeKind::TypeDefinition,
        NodeKind::CompoundStatement,
        NodeKind::IfStatement,
        NodeKind::WhileStatement,
        NodeKind::DoStatement,
        NodeKind::ForStatement,
        NodeKind::SwitchStatement,
        NodeKind::CaseStatement,
        NodeKind::ReturnStatement,
        NodeKind::JumpStatement,
        NodeKind::LabeledStatement,
        NodeKind::ExpressionStatement,
        NodeKind::Expression,
        NodeKind::Other,
    ];

    /// Position of this kind in [`NodeKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name used in dumps and error reports.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::TranslationUnit => "translation_unit",
            NodeKind::FunctionDecl => "function_decl",
            NodeKind::Declaration => "declaration",
            NodeKind::TypeDefinition => "type_definition",
            NodeKind::CompoundStatement => "compound_statement",
            NodeKind::IfStatement => "if_statement",
            NodeKind::WhileStatement => "while_statement",
            NodeKind::DoStatement => "do_statement",
            NodeKind::ForStatement => "for_statement",
            NodeKind::SwitchStatement => "switch_statement",
            NodeKind::CaseStatement => "case_statement",
            NodeKind::ReturnStatement => "return_statement",
            NodeKind::JumpStatement => "jump_statement",
            NodeKind::LabeledStatement => "labeled_statement",
            NodeKind::ExpressionStatement => "expression_statement",
            NodeKind::Expression => "expression",
            NodeKind::Other => "other",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role of a child within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Condition,
    Consequence,
    Alternative,
    Body,
    Declarator,
    Type,
    Value,
    Initializer,
    Update,
    Label,
    Parameters,
    Arguments,
}

impl Field {
    /// Map a grammar field name onto a [`Field`].
    pub fn from_name(name: &str) -> Option<Field> {
        let field = match name {
            "condition" => Field::Condition,
            "consequence" => Field::Consequence,
            "alternative" => Field::Alternative,
            "body" => Field::Body,
            "declarator" => Field::Declarator,
            "type" => Field::Type,
            "value" => Field::Value,
            "initializer" => Field::Initializer,
            "update" => Field::Update,
            "label" => Field::Label,
            "parameters" => Field::Parameters,
            "arguments" => Field::Arguments,
            _ => return None,
        };
        Some(field)
    }

    /// Name used in dumps.
    pub fn name(self) -> &'static str {
        match self {
            Field::Condition => "condition",
            Field::Consequence => "consequence",
            Field::Alternative => "alternative",
            Field::Body => "body",
            Field::Declarator => "declarator",
            Field::Type => "type",
            Field::Value => "value",
            Field::Initializer => "initializer",
            Field::Update => "update",
            Field::Label => "label",
            Field::Parameters => "parameters",
            Field::Arguments => "arguments",
        }
    }
}

/// Declared name and return type of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: String,
}

/// Kind-specific metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeDetail {
    #[default]
    None,
    Function(FunctionSignature),
}

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct ChildRef {
    field: Option<Field>,
    id: NodeId,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: NodeKind,
    start: usize,
    end_marker: usize,
    detail: NodeDetail,
    children: Vec<ChildRef>,
}

/// Errors from assembling a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A node id does not belong to this builder.
    #[error("unknown node id {0}")]
    UnknownNode(u32),

    /// A node's end marker lies before its start.
    #[error("{kind} node has end marker {end_marker} before start {start}")]
    InvertedSpan {
        kind: NodeKind,
        start: usize,
        end_marker: usize,
    },

    /// A node was attached to two parents.
    #[error("node {0} already has a parent")]
    AlreadyAttached(u32),

    /// A node was attached to itself.
    #[error("node {0} cannot be its own child")]
    SelfAttached(u32),

    /// The requested root is attached to a parent.
    #[error("root node {0} has a parent")]
    RootHasParent(u32),
}

/// Incremental construction of a [`SyntaxTree`].
///
/// ```
/// use srcmark_cst::nodes::{Field, NodeKind, TreeBuilder};
///
/// // "if (x) y();"
/// let mut builder = TreeBuilder::new();
/// let stmt = builder.node(NodeKind::IfStatement, 0, 10);
/// let cond = builder.node(NodeKind::Expression, 3, 5);
/// let then = builder.node(NodeKind::ExpressionStatement, 7, 10);
/// builder.attach(stmt, Some(Field::Condition), cond).unwrap();
/// builder.attach(stmt, Some(Field::Consequence), then).unwrap();
/// let tree = builder.finish(stmt).unwrap();
///
/// assert_eq!(tree.root().child(Field::Consequence).unwrap().start(), 7);
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeRecord>,
    has_parent: Vec<bool>,
}

impl TreeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node and return its id.
    pub fn node(&mut self, kind: NodeKind, start: usize, end_marker: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            kind,
            start,
            end_marker,
            detail: NodeDetail::None,
            children: Vec::new(),
        });
        self.has_parent.push(false);
        id
    }

    /// Attach metadata to a node.
    pub fn set_detail(&mut self, id: NodeId, detail: NodeDetail) -> Result<(), TreeError> {
        self.record_mut(id)?.detail = detail;
        Ok(())
    }

    /// Append `child` to `parent`'s children under an optional field.
    pub fn attach(
        &mut self,
        parent: NodeId,
        field: Option<Field>,
        child: NodeId,
    ) -> Result<(), TreeError> {
        self.record_mut(child)?;
        if parent == child {
            return Err(TreeError::SelfAttached(child.0));
        }
        if self.has_parent[child.index()] {
            return Err(TreeError::AlreadyAttached(child.0));
        }
        self.record_mut(parent)?
            .children
            .push(ChildRef { field, id: child });
        self.has_parent[child.index()] = true;
        Ok(())
    }

    /// Validate spans, sort children into source order and freeze the tree.
    ///
    /// Nodes not reachable from `root` are kept in the arena but never
    /// visited.
    pub fn finish(mut self, root: NodeId) -> Result<SyntaxTree, TreeError> {
        self.record_mut(root)?;
        if self.has_parent[root.index()] {
            return Err(TreeError::RootHasParent(root.0));
        }
        for record in &self.nodes {
            if record.end_marker < record.start {
                return Err(TreeError::InvertedSpan {
                    kind: record.kind,
                    start: record.start,
                    end_marker: record.end_marker,
                });
            }
        }

        // Single-parent attachment plus a parentless root rules out cycles
        // among the nodes reachable from it.
        let starts: Vec<usize> = self.nodes.iter().map(|n| n.start).collect();
        for record in &mut self.nodes {
            record.children.sort_by_key(|c| starts[c.id.index()]);
        }

        Ok(SyntaxTree {
            nodes: self.nodes,
            root,
        })
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, TreeError> {
        self.nodes
            .get_mut(id.index())
            .ok_or(TreeError::UnknownNode(id.0))
    }
}

/// An immutable syntax tree for one source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeRecord>,
    root: NodeId,
}

impl SyntaxTree {
    /// The root node.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: self.root,
        }
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena has no nodes. A finished tree always has a root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render the tree one node per line, indented by depth.
    ///
    /// ```text
    /// translation_unit [0, 20]
    ///   function_decl [0, 20] f -> int
    ///     body: compound_statement [8, 20]
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root(), None, 0usize)];
        while let Some((node, field, depth)) = stack.pop() {
            let _ = write!(out, "{:indent$}", "", indent = depth * 2);
            if let Some(field) = field {
                let _ = write!(out, "{}: ", Field::name(field));
            }
            let _ = write!(out, "{} [{}, {}]", node.kind(), node.start(), node.end_marker());
            if let Some(sig) = node.function_signature() {
                let _ = write!(out, " {} -> {}", sig.name, sig.return_type);
            }
            out.push('\n');

            let children: Vec<_> = node.fields().collect();
            for (field, child) in children.into_iter().rev() {
                stack.push((child, field, depth + 1));
            }
        }
        out
    }
}

/// A borrowed handle to one node.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    fn record(&self) -> &'t NodeRecord {
        &self.tree.nodes[self.id.index()]
    }

    /// Dispatch tag.
    pub fn kind(&self) -> NodeKind {
        self.record().kind
    }

    /// Offset of the first token.
    pub fn start(&self) -> usize {
        self.record().start
    }

    /// Offset where the last token *begins*.
    pub fn end_marker(&self) -> usize {
        self.record().end_marker
    }

    /// Kind-specific metadata.
    pub fn detail(&self) -> &'t NodeDetail {
        &self.record().detail
    }

    /// Name and return type, for function nodes built with them.
    pub fn function_signature(&self) -> Option<&'t FunctionSignature> {
        match self.detail() {
            NodeDetail::Function(sig) => Some(sig),
            NodeDetail::None => None,
        }
    }

    /// Children in source order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + 't {
        let tree = self.tree;
        self.record()
            .children
            .iter()
            .map(move |c| SyntaxNode { tree, id: c.id })
    }

    /// Children with their fields, in source order.
    pub fn fields(&self) -> impl DoubleEndedIterator<Item = (Option<Field>, SyntaxNode<'t>)> + 't {
        let tree = self.tree;
        self.record()
            .children
            .iter()
            .map(move |c| (c.field, SyntaxNode { tree, id: c.id }))
    }

    /// First child attached under `field`.
    pub fn child(&self, field: Field) -> Option<SyntaxNode<'t>> {
        self.fields()
            .find(|(f, _)| *f == Some(field))
            .map(|(_, node)| node)
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.record().children.len()
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.kind())
            .field("start", &self.start())
            .field("end_marker", &self.end_marker())
            .finish()
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}
