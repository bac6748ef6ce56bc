//! Error bridges into the unified `SrcmarkError`.
//!
//! These live in the root crate rather than `srcmark-core` because they
//! depend on types (configuration, frontend, annotation) that core does not
//! know about. Errors that need the file being processed to be reported
//! usefully are bridged by functions instead of `From` impls.

use srcmark_core::error::SrcmarkError;
use srcmark_core::text::byte_offset_to_position_str;
use srcmark_cst::ParseError;

use crate::annotate::AnnotateError;
use crate::config::ConfigError;

// ============================================================================
// Bridge: ConfigError -> SrcmarkError
// ============================================================================

impl From<ConfigError> for SrcmarkError {
    fn from(err: ConfigError) -> Self {
        SrcmarkError::invalid_args(err.to_string())
    }
}

// ============================================================================
// Bridges that need file context
// ============================================================================

/// A frontend failure while processing `file`.
///
/// Syntax errors are the input's fault; every other failure is ours.
pub(crate) fn parse_failure(file: &str, err: ParseError) -> SrcmarkError {
    match err {
        ParseError::Syntax { line, col, .. } => SrcmarkError::ParseError {
            file: file.to_string(),
            message: err.to_string(),
            line: Some(line),
            col: Some(col),
        },
        ParseError::Language(_) | ParseError::NoTree | ParseError::Tree(_) => {
            SrcmarkError::internal(format!("{file}: {err}"))
        }
    }
}

/// An annotation failure in `file`, located against its `source`.
pub(crate) fn annotation_failure(file: &str, source: &str, err: AnnotateError) -> SrcmarkError {
    let offset = err.offset();
    let (line, col) = byte_offset_to_position_str(source, offset);
    SrcmarkError::AnnotationFailed {
        file: file.to_string(),
        message: err.to_string(),
        offset,
        line,
        col,
        node_kind: err.kind().name().to_string(),
    }
}
