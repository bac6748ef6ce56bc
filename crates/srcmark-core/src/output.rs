//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Structured JSON:** All structured CLI output is valid JSON; `annotate
//!    --stdout` and `dump` print plain text instead
//! 2. **Status first:** Every response has `status` as first field
//! 3. **Deterministic:** Same input -> same output (field order, array ordering)
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, SrcmarkError};
use crate::patch::{ContentHash, PendingEdit, Placement};
use crate::text::byte_offset_to_position_str;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// A file position for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path.
    pub file: String,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column (chars).
    pub col: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
        }
    }
}

/// One inserted marker, as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditInfo {
    /// Byte offset in the original source.
    pub offset: usize,
    /// 1-indexed line of the offset in the original source.
    pub line: u32,
    /// 1-indexed column of the offset in the original source.
    pub col: u32,
    /// Placement at the offset.
    pub placement: Placement,
    /// Inserted text.
    pub text: String,
}

impl EditInfo {
    /// Describe `edit` against the original `source`.
    pub fn from_edit(source: &str, edit: &PendingEdit) -> Self {
        let (line, col) = byte_offset_to_position_str(source, edit.offset);
        EditInfo {
            offset: edit.offset,
            line,
            col,
            placement: edit.placement,
            text: edit.text.clone(),
        }
    }
}

/// Outcome of annotating one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Input path as given.
    pub input: String,
    /// Derived output path.
    pub output: String,
    /// Whether the output file was written.
    pub written: bool,
    /// SHA-256 of the input bytes.
    pub input_hash: ContentHash,
    /// SHA-256 of the annotated text.
    pub output_hash: ContentHash,
    /// Number of nodes visited.
    pub nodes_visited: usize,
    /// Inserted markers in emission order.
    pub edits: Vec<EditInfo>,
}

/// Response for the annotate command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// True when nothing was written.
    pub dry_run: bool,
    /// One report per input, in argument order.
    pub files: Vec<FileReport>,
}

impl AnnotateResponse {
    /// Create a successful annotate response.
    pub fn new(dry_run: bool, files: Vec<FileReport>) -> Self {
        AnnotateResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            dry_run,
            files,
        }
    }

    /// Total edits across all files.
    pub fn total_edits(&self) -> usize {
        self.files.iter().map(|f| f.edits.len()).sum()
    }
}

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ErrorInfo {
    /// Create from a SrcmarkError.
    pub fn from_error(err: &SrcmarkError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            SrcmarkError::FileNotFound { path } => {
                (Some(serde_json::json!({ "path": path })), None)
            }
            SrcmarkError::ParseError {
                file,
                line: Some(line),
                col: Some(col),
                ..
            } => (None, Some(Location::new(file.clone(), *line, *col))),
            SrcmarkError::AnnotationFailed {
                file,
                offset,
                line,
                col,
                node_kind,
                ..
            } => (
                Some(serde_json::json!({ "offset": offset, "node_kind": node_kind })),
                Some(Location::new(file.clone(), *line, *col)),
            ),
            SrcmarkError::ApplyError { file, .. } => {
                let details = file.as_ref().map(|f| serde_json::json!({ "file": f }));
                (details, None)
            }
            _ => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// The error.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a SrcmarkError.
    pub fn from_error(err: &SrcmarkError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
