// Copyright (c) srcmark contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C syntax trees for srcmark.
//!
//! # Overview
//!
//! - **Tree model**: [`nodes::SyntaxTree`] is an arena of nodes with a
//!   closed [`nodes::NodeKind`] tag, a start offset and an end marker.
//! - **Traversal**: [`visitor::traverse`] walks a tree in pre-order and
//!   calls the handlers registered in a [`visitor::DispatchTable`].
//! - **Token boundaries**: [`lexer::end_of_token`] turns an end marker into
//!   the offset just past the node's last token.
//! - **Frontend**: [`parse_c`] builds a tree from C source using the
//!   tree-sitter C grammar.
//!
//! # Quick Start
//!
//! ```
//! use srcmark_cst::{parse_c, ParseOptions};
//! use srcmark_cst::nodes::NodeKind;
//!
//! let tree = parse_c("int main(void) { return 0; }", ParseOptions::default())
//!     .expect("parse error");
//! let func = tree.root().children().next().unwrap();
//! assert_eq!(func.kind(), NodeKind::FunctionDecl);
//! assert_eq!(func.function_signature().unwrap().name, "main");
//! ```

pub mod frontend;
pub mod lexer;
pub mod nodes;
pub mod visitor;

pub use frontend::{parse_c, ParseError, ParseOptions};
