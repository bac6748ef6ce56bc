//! File pipeline: read, parse, annotate, name, write.
//!
//! The writer only ever sees a complete annotation. Any failure before the
//! write leaves the output path untouched; a failure while writing reports
//! the output file.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, info_span};

use srcmark_core::error::SrcmarkError;
use srcmark_core::output::{EditInfo, FileReport};
use srcmark_core::patch::ContentHash;
use srcmark_cst::nodes::SyntaxTree;
use srcmark_cst::parse_c;

use crate::annotate::{annotate, Annotation};
use crate::config::Config;
use crate::error_bridges::{annotation_failure, parse_failure};
use crate::policy::dispatch_table;

/// Whether [`annotate_file`] writes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Write the annotated file.
    Write,
    /// Compute everything, write nothing.
    DryRun,
}

/// Outcome of annotating one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// What was done, for the JSON response.
    pub report: FileReport,
    /// The annotated text.
    pub text: String,
}

/// Parse `source` with the configured options.
///
/// `file` only labels errors.
pub fn parse_source(file: &str, source: &str, config: &Config) -> Result<SyntaxTree, SrcmarkError> {
    parse_c(source, config.parse_options()).map_err(|e| parse_failure(file, e))
}

/// Parse and annotate `source` with the configured rules and markers.
///
/// `file` only labels errors.
pub fn annotate_source(
    file: &str,
    source: &str,
    config: &Config,
) -> Result<Annotation, SrcmarkError> {
    let tree = parse_source(file, source, config)?;
    let table = dispatch_table(&config.rules);
    annotate(source, tree.root(), &table, &config.markers)
        .map_err(|e| annotation_failure(file, source, e))
}

/// Read a source file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String, SrcmarkError> {
    let file = path.display().to_string();
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SrcmarkError::file_not_found(file.clone()),
        io::ErrorKind::InvalidData => SrcmarkError::ParseError {
            file: file.clone(),
            message: "input is not valid UTF-8".to_string(),
            line: None,
            col: None,
        },
        _ => SrcmarkError::ParseError {
            file: file.clone(),
            message: format!("cannot read input: {e}"),
            line: None,
            col: None,
        },
    })
}

/// Annotate the file at `path` and, unless `mode` is a dry run, write the
/// result to the configured output path.
pub fn annotate_file(
    path: &Path,
    config: &Config,
    mode: WriteMode,
) -> Result<FileOutcome, SrcmarkError> {
    let file = path.display().to_string();
    let _span = info_span!("annotate_file", path = %file).entered();

    let output_path = config.output.output_path(path)?;
    let source = read_source(path)?;
    let annotation = annotate_source(&file, &source, config)?;
    debug!(
        edits = annotation.edits.len(),
        output = %output_path.display(),
        "annotated"
    );

    let written = match mode {
        WriteMode::DryRun => false,
        WriteMode::Write => {
            let output = output_path.display().to_string();
            if let Some(parent) = output_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| {
                        SrcmarkError::apply(format!("cannot create {}: {e}", parent.display()), &output)
                    })?;
                }
            }
            fs::write(&output_path, annotation.text.as_bytes())
                .map_err(|e| SrcmarkError::apply(format!("cannot write {output}: {e}"), &output))?;
            info!(output = %output, edits = annotation.edits.len(), "wrote annotated file");
            true
        }
    };

    let report = FileReport {
        input: file,
        output: output_path.display().to_string(),
        written,
        input_hash: ContentHash::compute(source.as_bytes()),
        output_hash: ContentHash::compute(annotation.text.as_bytes()),
        nodes_visited: annotation.stats.visited,
        edits: annotation
            .edits
            .iter()
            .map(|edit| EditInfo::from_edit(&source, edit))
            .collect(),
    };

    Ok(FileOutcome {
        report,
        text: annotation.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Rule;
    use srcmark_core::error::OutputErrorCode;
    use tempfile::TempDir;

    #[test]
    fn annotate_source_applies_configured_rules() {
        let config = Config {
            rules: vec![Rule::Function],
            ..Config::default()
        };
        let annotation =
            annotate_source("t.c", "int f(int x) { if (x) return 1; return 0; }\n", &config)
                .unwrap();
        assert_eq!(annotation.edits.len(), 2);
        assert!(annotation.text.starts_with("// Begin function f returning int\n"));
        assert!(!annotation.text.contains("'if' part"));
    }

    #[test]
    fn annotate_source_reports_syntax_errors() {
        let err = annotate_source("t.c", "int f( {\n", &Config::default()).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
    }

    #[test]
    fn missing_input_is_file_not_found() {
        let dir = TempDir::new().unwrap();
        let err = annotate_file(&dir.path().join("nope.c"), &Config::default(), WriteMode::Write)
            .unwrap_err();
        assert!(matches!(err, SrcmarkError::FileNotFound { .. }));
    }

    #[test]
    fn non_utf8_input_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.c");
        fs::write(&input, [0x69, 0x6e, 0x74, 0xff, 0x3b]).unwrap();
        let err = annotate_file(&input, &Config::default(), WriteMode::Write).unwrap_err();
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
        assert!(!dir.path().join("badM.c").exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("f.c");
        fs::write(&input, "int f(void) { return 0; }\n").unwrap();
        let outcome = annotate_file(&input, &Config::default(), WriteMode::DryRun).unwrap();
        assert!(!outcome.report.written);
        assert!(outcome.report.output.ends_with("fM.c"));
        assert!(!dir.path().join("fM.c").exists());
        assert_eq!(outcome.report.edits.len(), 2);
    }

    #[test]
    fn output_directory_is_created() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("f.c");
        fs::write(&input, "int f(void) { return 0; }\n").unwrap();
        let mut config = Config::default();
        config.output.directory = Some(dir.path().join("out").join("nested"));
        let outcome = annotate_file(&input, &config, WriteMode::Write).unwrap();
        assert!(outcome.report.written);
        let written = fs::read_to_string(dir.path().join("out/nested/fM.c")).unwrap();
        assert_eq!(written, outcome.text);
    }
}
