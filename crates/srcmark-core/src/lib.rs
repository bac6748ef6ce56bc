//! Core infrastructure for srcmark.
//!
//! This crate provides language-agnostic infrastructure:
//! - Edit IR (spans, placements, pending insertions)
//! - The offset-keyed edit buffer that rewrites one file
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Output path naming
//! - Text position utilities

pub mod error;
pub mod naming;
pub mod output;
pub mod patch;
pub mod rewriter;
pub mod text;
