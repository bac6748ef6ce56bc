//! srcmark: offset-safe source annotation.
//!
//! Walks the syntax tree of a C file and inserts marker comments around
//! function definitions and the branches of `if` statements. Every marker is
//! recorded against an offset in the *original* source and the output is
//! produced in one pass, so no recorded offset is ever invalidated.
//!
//! ```
//! use srcmark::config::Config;
//! use srcmark::pipeline::annotate_source;
//!
//! let annotation = annotate_source("f.c", "int f() { return 1; }", &Config::default()).unwrap();
//! assert_eq!(
//!     annotation.text,
//!     "// Begin function f returning int\nint f() { return 1; }\n// End function f"
//! );
//! ```

// Core infrastructure - re-exported from srcmark-core
pub use srcmark_core::error;
pub use srcmark_core::naming;
pub use srcmark_core::output;
pub use srcmark_core::patch;
pub use srcmark_core::rewriter;
pub use srcmark_core::text;

// Syntax trees, traversal and the C frontend
pub use srcmark_cst as cst;

pub mod annotate;
pub mod config;
pub mod pipeline;
pub mod policy;

// Front door
pub mod cli;

// Error bridges - converts subsystem errors to SrcmarkError
mod error_bridges;

pub use annotate::{annotate, Annotation, AnnotateError};
