//! Error types and error code constants for srcmark.
//!
//! This module provides a unified error type (`SrcmarkError`) that bridges
//! domain-specific errors from the subsystems (rewriter, lexer, frontend,
//! configuration) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad flags, bad configuration)
//! - `3`: Resolution errors (input not found or unreadable, syntax errors)
//! - `4`: Apply errors (failed to write the annotated file)
//! - `5`: Inconsistent input (tree spans and source text disagree)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `SrcmarkError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for SrcmarkError` bridges domain errors
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for JSON

use std::fmt;

use thiserror::Error;

use crate::naming::NamingError;

/// Error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad flags, malformed configuration).
    InvalidArguments = 2,
    /// Resolution errors (file not found, unreadable, unparsable).
    ResolutionError = 3,
    /// Apply errors (failed to write output).
    ApplyError = 4,
    /// The syntax tree and the source text disagree.
    InconsistentInput = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum SrcmarkError {
    /// Invalid arguments or configuration.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Input could not be parsed into a syntax tree.
    #[error("parse error in {file}: {message}")]
    ParseError {
        file: String,
        message: String,
        line: Option<u32>,
        col: Option<u32>,
    },

    /// Annotation aborted because an offset did not fit the source.
    #[error("annotation failed in {file} at {line}:{col} ({node_kind}): {message}")]
    AnnotationFailed {
        file: String,
        message: String,
        offset: usize,
        line: u32,
        col: u32,
        node_kind: String,
    },

    /// Failed to write output.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl From<&SrcmarkError> for OutputErrorCode {
    fn from(err: &SrcmarkError) -> Self {
        match err {
            SrcmarkError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            SrcmarkError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            SrcmarkError::ParseError { .. } => OutputErrorCode::ResolutionError,
            SrcmarkError::AnnotationFailed { .. } => OutputErrorCode::InconsistentInput,
            SrcmarkError::ApplyError { .. } => OutputErrorCode::ApplyError,
            SrcmarkError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<SrcmarkError> for OutputErrorCode {
    fn from(err: SrcmarkError) -> Self {
        OutputErrorCode::from(&err)
    }
}

/// A bad output mapping is a configuration problem.
impl From<NamingError> for SrcmarkError {
    fn from(err: NamingError) -> Self {
        SrcmarkError::invalid_args(err.to_string())
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl SrcmarkError {
    /// Create an InvalidArguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        SrcmarkError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        SrcmarkError::FileNotFound { path: path.into() }
    }

    /// Create an ApplyError naming the file that could not be written.
    pub fn apply(message: impl Into<String>, file: impl Into<String>) -> Self {
        SrcmarkError::ApplyError {
            message: message.into(),
            file: Some(file.into()),
        }
    }

    /// Create an InternalError.
    pub fn internal(message: impl Into<String>) -> Self {
        SrcmarkError::InternalError {
            message: message.into(),
        }
    }

    /// Error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}
