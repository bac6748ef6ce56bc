// Copyright (c) srcmark contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Kind-indexed dispatch and the tree walk that drives it.
//!
//! Traversal order:
//!
//! - **Pre-order**: a node's handler runs before any of its children are visited
//! - **Source order**: children are visited left-to-right
//! - **Total**: every node reachable from the root is visited exactly once;
//!   handlers cannot prune descent
//!
//! The only way to end a walk early is for a handler to return an error,
//! which is handed back to the caller unchanged.

use std::fmt;

use tracing::trace;

use crate::nodes::{NodeKind, SyntaxNode};

/// A node handler: reads the node, mutates the caller's context.
pub type Handler<C, E> = fn(&mut C, SyntaxNode<'_>) -> Result<(), E>;

/// Mapping from node kind to an optional handler.
///
/// Handlers are plain function pointers stored in an array indexed by
/// [`NodeKind`], so a lookup is one bounds-checked load.
pub struct DispatchTable<C, E> {
    handlers: [Option<Handler<C, E>>; NodeKind::COUNT],
}

impl<C, E> DispatchTable<C, E> {
    /// A table with no handlers. Walking with it visits every node and
    /// changes nothing.
    pub fn new() -> Self {
        DispatchTable {
            handlers: [None; NodeKind::COUNT],
        }
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: NodeKind, handler: Handler<C, E>) -> &mut Self {
        self.handlers[kind.index()] = Some(handler);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, kind: NodeKind, handler: Handler<C, E>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Handler registered for `kind`, if any.
    pub fn handler(&self, kind: NodeKind) -> Option<Handler<C, E>> {
        self.handlers[kind.index()]
    }

    /// True when no kind has a handler.
    pub fn is_empty(&self) -> bool {
        self.handlers.iter().all(Option::is_none)
    }

    /// Kinds with a registered handler, in [`NodeKind::ALL`] order.
    pub fn kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        NodeKind::ALL
            .into_iter()
            .filter(|kind| self.handlers[kind.index()].is_some())
    }
}

impl<C, E> Default for DispatchTable<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> fmt::Debug for DispatchTable<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}

/// Counters from one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Nodes visited.
    pub visited: usize,
    /// Handler invocations.
    pub dispatched: usize,
}

/// Walk the tree under `root` in pre-order, invoking registered handlers.
///
/// The walk keeps an explicit stack, so deeply nested input cannot overflow
/// the call stack. The first handler error stops the walk; the context may
/// then hold partial results and should be discarded.
pub fn traverse<C, E>(
    root: SyntaxNode<'_>,
    table: &DispatchTable<C, E>,
    context: &mut C,
) -> Result<TraversalStats, E> {
    let mut stats = TraversalStats::default();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        stats.visited += 1;

        if let Some(handler) = table.handler(node.kind()) {
            trace!(kind = %node.kind(), start = node.start(), "dispatch");
            handler(context, node)?;
            stats.dispatched += 1;
        }

        // Reverse so the leftmost child is popped first
        stack.extend(node.children().rev());
    }

    Ok(stats)
}
