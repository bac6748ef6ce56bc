//! CLI front door.
//!
//! Helpers behind the `srcmark` subcommands:
//! - `annotate` - annotate files and report what was inserted (JSON)
//! - `annotate --stdout` - print the annotated text of one file
//! - `dump` - print the syntax tree of one file
//!
//! All functions return `Result<String, SrcmarkError>`; the caller prints the
//! string and maps errors to exit codes.

use std::path::{Path, PathBuf};

use tracing::info;

use srcmark_core::error::SrcmarkError;
use srcmark_core::output::AnnotateResponse;

use crate::config::Config;
use crate::pipeline::{annotate_file, parse_source, read_source, WriteMode};

/// Annotate `files` in order and return the JSON response.
///
/// The first failure stops the run. Outputs written for earlier files are
/// kept; the failing file's output is not touched.
pub fn run_annotate(
    files: &[PathBuf],
    config: &Config,
    dry_run: bool,
) -> Result<String, SrcmarkError> {
    if files.is_empty() {
        return Err(SrcmarkError::invalid_args("no input files"));
    }
    let mode = if dry_run {
        WriteMode::DryRun
    } else {
        WriteMode::Write
    };

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        reports.push(annotate_file(path, config, mode)?.report);
    }

    let response = AnnotateResponse::new(dry_run, reports);
    info!(
        files = response.files.len(),
        edits = response.total_edits(),
        dry_run,
        "annotate finished"
    );
    serde_json::to_string_pretty(&response)
        .map_err(|e| SrcmarkError::internal(format!("JSON serialization error: {}", e)))
}

/// Annotate one file and return its annotated text. Nothing is written.
pub fn run_annotate_to_stdout(file: &Path, config: &Config) -> Result<String, SrcmarkError> {
    Ok(annotate_file(file, config, WriteMode::DryRun)?.text)
}

/// Parse one file and return its tree dump.
pub fn run_dump(file: &Path, config: &Config) -> Result<String, SrcmarkError> {
    let label = file.display().to_string();
    let source = read_source(file)?;
    let tree = parse_source(&label, &source, config)?;
    Ok(tree.dump())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn annotate_response_lists_files_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.c");
        let b = dir.path().join("b.c");
        fs::write(&a, "int a(void) { return 0; }\n").unwrap();
        fs::write(&b, "int b;\n").unwrap();

        let json = run_annotate(&[a, b], &Config::default(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["dry_run"], true);
        let files = value["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0]["input"].as_str().unwrap().ends_with("a.c"));
        assert_eq!(files[0]["edits"].as_array().unwrap().len(), 2);
        assert_eq!(files[1]["edits"].as_array().unwrap().len(), 0);
        assert_eq!(files[1]["input_hash"], files[1]["output_hash"]);
    }

    #[test]
    fn empty_file_list_is_invalid() {
        let err = run_annotate(&[], &Config::default(), false).unwrap_err();
        assert!(matches!(err, SrcmarkError::InvalidArguments { .. }));
    }

    #[test]
    fn dump_prints_tree() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.c");
        fs::write(&path, "int main(void) { return 0; }\n").unwrap();
        let dump = run_dump(&path, &Config::default()).unwrap();
        assert!(dump.starts_with("translation_unit"));
        assert!(dump.contains("function_decl"));
        assert!(dump.contains("main -> int"));
    }
}
