// Copyright (c) srcmark contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C frontend: tree-sitter parse tree to [`SyntaxTree`].
//!
//! The tree-sitter C grammar does the parsing. This module converts its
//! concrete tree into the arena model:
//!
//! - every named node except comments becomes a node, classified into a
//!   [`NodeKind`]
//! - `else_clause` wrappers are dropped and the statement they hold becomes
//!   the [`Field::Alternative`] child of the `if`
//! - each node's end marker is the start of its last real token: trailing
//!   comments, zero-width recovery nodes and newline tokens are skipped, and
//!   literals count as one token even though the grammar splits them
//! - function definitions and function prototypes become
//!   [`NodeKind::FunctionDecl`] carrying a [`FunctionSignature`]; only
//!   definitions have a [`Field::Body`] child

use thiserror::Error;
use tracing::debug;
use tree_sitter::{Node, Parser};

use srcmark_core::text::{byte_offset_to_position_str, normalize_whitespace};

use crate::nodes::{
    Field, FunctionSignature, NodeDetail, NodeId, NodeKind, SyntaxTree, TreeBuilder, TreeError,
};

/// Grammar nodes whose children are pieces of a single lexical token.
const ATOMIC_TOKENS: &[&str] = &[
    "string_literal",
    "char_literal",
    "number_literal",
    "system_lib_string",
    "raw_string_literal",
];

/// Leaf expressions that do not end in `_expression`.
const EXPRESSION_LEAVES: &[&str] = &[
    "identifier",
    "number_literal",
    "string_literal",
    "char_literal",
    "concatenated_string",
    "initializer_list",
    "true",
    "false",
    "null",
];

/// Errors from parsing C source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The C grammar could not be loaded into the parser.
    #[error("failed to load the C grammar: {0}")]
    Language(String),

    /// The parser returned no tree.
    #[error("parser produced no tree")]
    NoTree,

    /// The source has a syntax error and errors are not allowed.
    #[error("syntax error at {line}:{col}: {message}")]
    Syntax {
        offset: usize,
        line: u32,
        col: u32,
        message: String,
    },

    /// The converted tree was rejected.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Parser options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep going when the source has syntax errors. Error regions become
    /// [`NodeKind::Other`] nodes.
    pub allow_syntax_errors: bool,
}

/// Parse C `source` into a [`SyntaxTree`].
pub fn parse_c(source: &str, options: ParseOptions) -> Result<SyntaxTree, ParseError> {
    let language: tree_sitter::Language = tree_sitter_c::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::Language(e.to_string()))?;

    let ts_tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
    let root = ts_tree.root_node();

    if root.has_error() && !options.allow_syntax_errors {
        return Err(first_syntax_error(source, root));
    }

    let mut converter = Converter {
        source,
        builder: TreeBuilder::new(),
    };
    let root_id = converter.convert(root)?;
    let tree = converter.builder.finish(root_id)?;
    debug!(nodes = tree.len(), bytes = source.len(), "converted C parse tree");
    Ok(tree)
}

struct Converter<'s> {
    source: &'s str,
    builder: TreeBuilder,
}

impl Converter<'_> {
    fn convert(&mut self, root: Node<'_>) -> Result<NodeId, ParseError> {
        let root_id = self.add(root)?;
        let mut stack = vec![(root, root_id)];

        while let Some((ts_node, parent)) = stack.pop() {
            for (field, child) in named_children(ts_node) {
                if child.kind() == "else_clause" {
                    for (_, inner) in named_children(child) {
                        let id = self.add(inner)?;
                        self.builder.attach(parent, Some(Field::Alternative), id)?;
                        stack.push((inner, id));
                    }
                    continue;
                }
                let id = self.add(child)?;
                self.builder
                    .attach(parent, field.and_then(Field::from_name), id)?;
                stack.push((child, id));
            }
        }

        Ok(root_id)
    }

    fn add(&mut self, node: Node<'_>) -> Result<NodeId, ParseError> {
        let kind = classify(node);
        let end_marker = last_token_start(node, self.source);
        let id = self.builder.node(kind, node.start_byte(), end_marker);
        if kind == NodeKind::FunctionDecl {
            if let Some(signature) = function_signature(node, self.source) {
                self.builder.set_detail(id, NodeDetail::Function(signature))?;
            }
        }
        Ok(id)
    }
}

/// Named, non-comment children with their grammar field names.
fn named_children<'t>(node: Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut children = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && !child.is_extra() {
                children.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    children
}

fn classify(node: Node<'_>) -> NodeKind {
    match node.kind() {
        "translation_unit" => NodeKind::TranslationUnit,
        "function_definition" => NodeKind::FunctionDecl,
        "declaration" => {
            let declares_function = node
                .child_by_field_name("declarator")
                .is_some_and(|d| DeclaratorShape::of(d).is_function());
            if declares_function {
                NodeKind::FunctionDecl
            } else {
                NodeKind::Declaration
            }
        }
        "type_definition" => NodeKind::TypeDefinition,
        "compound_statement" => NodeKind::CompoundStatement,
        "if_statement" => NodeKind::IfStatement,
        "while_statement" => NodeKind::WhileStatement,
        "do_statement" => NodeKind::DoStatement,
        "for_statement" => NodeKind::ForStatement,
        "switch_statement" => NodeKind::SwitchStatement,
        "case_statement" => NodeKind::CaseStatement,
        "return_statement" => NodeKind::ReturnStatement,
        "break_statement" | "continue_statement" | "goto_statement" => NodeKind::JumpStatement,
        "labeled_statement" => NodeKind::LabeledStatement,
        "expression_statement" => NodeKind::ExpressionStatement,
        kind if kind.ends_with("_expression") || EXPRESSION_LEAVES.contains(&kind) => {
            NodeKind::Expression
        }
        _ => NodeKind::Other,
    }
}

/// True if `node` covers at least one non-whitespace source byte and is a
/// real token carrier rather than a comment or a recovery placeholder.
fn carries_token(node: Node<'_>, source: &str) -> bool {
    !node.is_extra()
        && !node.is_missing()
        && source
            .get(node.start_byte()..node.end_byte())
            .is_some_and(|text| !text.trim().is_empty())
}

/// Start offset of the last token inside `node`.
fn last_token_start(node: Node<'_>, source: &str) -> usize {
    let mut current = node;
    loop {
        if current.child_count() == 0 || ATOMIC_TOKENS.contains(&current.kind()) {
            return current.start_byte();
        }
        let mut last = None;
        let mut cursor = current.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if carries_token(child, source) {
                    last = Some(child);
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        match last {
            Some(child) => current = child,
            None => return current.start_byte(),
        }
    }
}

/// Derivations between a declaration's type and its declared name.
struct DeclaratorShape<'t> {
    name: Option<Node<'t>>,
    /// Outermost first, e.g. `*f(void)` is `[Pointer, Function]`.
    derivations: Vec<(Derivation, Node<'t>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Derivation {
    Pointer,
    Function,
    Array,
}

impl<'t> DeclaratorShape<'t> {
    fn of(declarator: Node<'t>) -> Self {
        let mut derivations = Vec::new();
        let mut current = Some(declarator);
        while let Some(node) = current {
            let step = match node.kind() {
                "pointer_declarator" => Some(Derivation::Pointer),
                "function_declarator" => Some(Derivation::Function),
                "array_declarator" => Some(Derivation::Array),
                _ => None,
            };
            current = match node.kind() {
                "pointer_declarator" | "function_declarator" | "array_declarator"
                | "init_declarator" => node.child_by_field_name("declarator"),
                "parenthesized_declarator" | "attributed_declarator" => {
                    named_children(node).into_iter().map(|(_, n)| n).next()
                }
                _ => {
                    return DeclaratorShape {
                        name: Some(node),
                        derivations,
                    }
                }
            };
            derivations.extend(step.map(|d| (d, node)));
        }
        DeclaratorShape {
            name: None,
            derivations,
        }
    }

    /// The derivation nearest the name decides what the name is: in
    /// `int (*fp)(void)` that is the pointer, in `int *f(void)` the function.
    fn is_function(&self) -> bool {
        matches!(self.derivations.last(), Some((Derivation::Function, _)))
    }

    /// Abstract declarator of the function's result, e.g. `**` for
    /// `char **f(void)` and `(*)(int)` for `int (*f(void))(int)`.
    ///
    /// Built inside out starting next to the name, skipping the function's
    /// own parameter list.
    fn result_declarator(&self, source: &str) -> String {
        let inner = self.derivations.len().saturating_sub(1);
        let mut out = String::new();
        for (derivation, node) in self.derivations[..inner].iter().rev() {
            match derivation {
                Derivation::Pointer => {
                    let qualifiers = named_children(*node)
                        .into_iter()
                        .filter(|(_, n)| n.kind() == "type_qualifier")
                        .filter_map(|(_, n)| node_text(n, source))
                        .collect::<Vec<_>>()
                        .join(" ");
                    let mut pointer = "*".to_string();
                    if !qualifiers.is_empty() {
                        pointer.push_str(&qualifiers);
                        if !out.is_empty() {
                            pointer.push(' ');
                        }
                    }
                    out.insert_str(0, &pointer);
                }
                Derivation::Function | Derivation::Array => {
                    if out.starts_with('*') {
                        out = format!("({out})");
                    }
                    let suffix = match derivation {
                        Derivation::Function => node
                            .child_by_field_name("parameters")
                            .and_then(|p| node_text(p, source))
                            .unwrap_or_else(|| "()".to_string()),
                        _ => {
                            let size = node
                                .child_by_field_name("size")
                                .and_then(|n| node_text(n, source))
                                .unwrap_or_default();
                            format!("[{size}]")
                        }
                    };
                    out.push_str(&suffix);
                }
            }
        }
        out
    }
}

fn node_text(node: Node<'_>, source: &str) -> Option<String> {
    source
        .get(node.start_byte()..node.end_byte())
        .map(normalize_whitespace)
}

fn function_signature(node: Node<'_>, source: &str) -> Option<FunctionSignature> {
    let declarator = node.child_by_field_name("declarator")?;
    let shape = DeclaratorShape::of(declarator);
    let name = shape
        .name
        .and_then(|n| node_text(n, source))
        .unwrap_or_default();

    // Qualifiers and the type specifier that precede the declarator
    let mut parts = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.start_byte() >= declarator.start_byte() {
                break;
            }
            if child.kind() == "type_qualifier" || cursor.field_name() == Some("type") {
                parts.extend(node_text(child, source));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    let mut return_type = parts.join(" ");
    let result = shape.result_declarator(source);
    if !result.is_empty() {
        if !return_type.is_empty() {
            return_type.push(' ');
        }
        return_type.push_str(&result);
    }

    Some(FunctionSignature { name, return_type })
}

fn first_syntax_error(source: &str, root: Node<'_>) -> ParseError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let offset = node.start_byte();
            let (line, col) = byte_offset_to_position_str(source, offset);
            let message = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "unexpected syntax".to_string()
            };
            return ParseError::Syntax {
                offset,
                line,
                col,
                message,
            };
        }
        let mut cursor = node.walk();
        let mut children = Vec::new();
        if cursor.goto_first_child() {
            loop {
                children.push(cursor.node());
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        stack.extend(children.into_iter().rev());
    }

    let (line, col) = byte_offset_to_position_str(source, root.start_byte());
    ParseError::Syntax {
        offset: root.start_byte(),
        line,
        col,
        message: "unexpected syntax".to_string(),
    }
}
