// Copyright (c) srcmark contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Traversal infrastructure for syntax trees.
//!
//! Instead of a visitor trait with one method per node kind, callers fill a
//! [`DispatchTable`] that maps each [`NodeKind`](crate::nodes::NodeKind) to an
//! optional handler function, then hand it to [`traverse`] together with a
//! mutable context of their choosing:
//!
//! ```
//! use srcmark_cst::nodes::{NodeKind, SyntaxNode, TreeBuilder};
//! use srcmark_cst::visitor::{traverse, DispatchTable};
//!
//! fn count_ifs(count: &mut usize, _node: SyntaxNode<'_>) -> Result<(), ()> {
//!     *count += 1;
//!     Ok(())
//! }
//!
//! let mut builder = TreeBuilder::new();
//! let root = builder.node(NodeKind::CompoundStatement, 0, 20);
//! let stmt = builder.node(NodeKind::IfStatement, 2, 18);
//! builder.attach(root, None, stmt).unwrap();
//! let tree = builder.finish(root).unwrap();
//!
//! let table = DispatchTable::new().with(NodeKind::IfStatement, count_ifs);
//! let mut count = 0;
//! let stats = traverse(tree.root(), &table, &mut count).unwrap();
//! assert_eq!((count, stats.visited), (1, 2));
//! ```

mod dispatch;

pub use dispatch::{traverse, DispatchTable, Handler, TraversalStats};
