//! Configuration: rules, marker templates, output naming.
//!
//! Configuration is read from a JSON file. Every key is optional and unknown
//! keys are rejected:
//!
//! ```json
//! {
//!   "rules": ["conditional", "function"],
//!   "markers": { "function_open": "/* {name} -> {return_type} */\n", "indent_new_lines": true },
//!   "output": { "suffix": "M", "directory": null },
//!   "allow_syntax_errors": false
//! }
//! ```
//!
//! ## Marker templates
//!
//! Function markers may use `{name}` and `{return_type}`. Conditional markers
//! take no placeholders. `{{` and `}}` produce literal braces. Templates are
//! checked when the configuration is loaded, so expansion never fails.
//!
//! With `indent_new_lines` (the default) every newline inside an inserted
//! marker is followed by the indentation of the line the marker lands on, so
//! markers inside an indented body line up with the code around them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use srcmark_core::naming::OutputNaming;
use srcmark_cst::nodes::FunctionSignature;
use srcmark_cst::ParseOptions;

use crate::policy::Rule;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "srcmark.json";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A marker template is malformed.
    #[error("invalid marker template '{marker}': {message}")]
    InvalidTemplate { marker: String, message: String },

    /// The output naming would clobber inputs or is malformed.
    #[error("invalid output settings: {message}")]
    InvalidOutput { message: String },
}

// ============================================================================
// Marker templates
// ============================================================================

const DEFAULT_IF_OPEN: &str = "\n// the 'if' part\n";
const DEFAULT_IF_CLOSE: &str = "\n// end of the 'if' part\n";
const DEFAULT_ELSE_OPEN: &str = "\n// the 'else' part\n";
const DEFAULT_ELSE_CLOSE: &str = "\n// end of the 'else' part\n";
const DEFAULT_FUNCTION_OPEN: &str = "// Begin function {name} returning {return_type}\n";
const DEFAULT_FUNCTION_CLOSE: &str = "\n// End function {name}";

/// Substituted when a function node carries no signature.
const UNKNOWN_NAME: &str = "<anonymous>";
const UNKNOWN_TYPE: &str = "<unknown>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Name,
    ReturnType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece<'t> {
    Text(&'t str),
    Brace(char),
    Placeholder(Placeholder),
}

/// Split a template into literal text and placeholders.
fn pieces(template: &str) -> Result<Vec<Piece<'_>>, String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        if pos > 0 {
            out.push(Piece::Text(&rest[..pos]));
        }
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            out.push(Piece::Brace('{'));
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push(Piece::Brace('}'));
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            return Err(format!("unmatched '}}' at byte {}", template.len() - tail.len()));
        } else {
            let close = tail
                .find('}')
                .ok_or_else(|| "unterminated placeholder".to_string())?;
            let placeholder = match &tail[1..close] {
                "name" => Placeholder::Name,
                "return_type" => Placeholder::ReturnType,
                other => return Err(format!("unknown placeholder '{{{other}}}'")),
            };
            out.push(Piece::Placeholder(placeholder));
            rest = &tail[close + 1..];
        }
    }
    if !rest.is_empty() {
        out.push(Piece::Text(rest));
    }
    Ok(out)
}

fn expand(template: &str, signature: Option<&FunctionSignature>) -> String {
    // Templates were validated on load; fall back to the raw text otherwise
    let Ok(pieces) = pieces(template) else {
        return template.to_string();
    };
    let mut out = String::with_capacity(template.len());
    for piece in pieces {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Brace(c) => out.push(c),
            Piece::Placeholder(Placeholder::Name) => {
                let name = signature.map_or(UNKNOWN_NAME, |s| s.name.as_str());
                out.push_str(name);
            }
            Piece::Placeholder(Placeholder::ReturnType) => {
                let ty = signature.map_or(UNKNOWN_TYPE, |s| s.return_type.as_str());
                out.push_str(ty);
            }
        }
    }
    out
}

/// The six marker texts and how they are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerSet {
    pub if_open: String,
    pub if_close: String,
    pub else_open: String,
    pub else_close: String,
    pub function_open: String,
    pub function_close: String,
    /// Indent each line after a newline in a marker to the insertion line.
    pub indent_new_lines: bool,
}

impl Default for MarkerSet {
    fn default() -> Self {
        MarkerSet {
            if_open: DEFAULT_IF_OPEN.to_string(),
            if_close: DEFAULT_IF_CLOSE.to_string(),
            else_open: DEFAULT_ELSE_OPEN.to_string(),
            else_close: DEFAULT_ELSE_CLOSE.to_string(),
            function_open: DEFAULT_FUNCTION_OPEN.to_string(),
            function_close: DEFAULT_FUNCTION_CLOSE.to_string(),
            indent_new_lines: true,
        }
    }
}

impl MarkerSet {
    /// Check every template. Conditional markers must not use placeholders.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let templates = [
            ("if_open", &self.if_open, false),
            ("if_close", &self.if_close, false),
            ("else_open", &self.else_open, false),
            ("else_close", &self.else_close, false),
            ("function_open", &self.function_open, true),
            ("function_close", &self.function_close, true),
        ];
        for (marker, template, allows_placeholders) in templates {
            let invalid = |message: String| ConfigError::InvalidTemplate {
                marker: marker.to_string(),
                message,
            };
            let pieces = pieces(template).map_err(invalid)?;
            let has_placeholder = pieces.iter().any(|p| matches!(p, Piece::Placeholder(_)));
            if has_placeholder && !allows_placeholders {
                return Err(invalid("placeholders are only allowed in function markers".to_string()));
            }
        }
        Ok(())
    }

    pub fn if_open(&self) -> String {
        expand(&self.if_open, None)
    }

    pub fn if_close(&self) -> String {
        expand(&self.if_close, None)
    }

    pub fn else_open(&self) -> String {
        expand(&self.else_open, None)
    }

    pub fn else_close(&self) -> String {
        expand(&self.else_close, None)
    }

    /// Open marker for a function, placeholders filled from `signature`.
    pub fn function_open(&self, signature: Option<&FunctionSignature>) -> String {
        expand(&self.function_open, signature)
    }

    /// Close marker for a function, placeholders filled from `signature`.
    pub fn function_close(&self, signature: Option<&FunctionSignature>) -> String {
        expand(&self.function_close, signature)
    }
}

// ============================================================================
// Config
// ============================================================================

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rules to apply. Empty means the output equals the input.
    pub rules: Vec<Rule>,
    /// Marker texts.
    pub markers: MarkerSet,
    /// Output file naming.
    pub output: OutputNaming,
    /// Annotate files even if they have syntax errors.
    pub allow_syntax_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rules: Rule::ALL.to_vec(),
            markers: MarkerSet::default(),
            output: OutputNaming::default(),
            allow_syntax_errors: false,
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        debug!(path = %path.display(), rules = ?config.rules, "loaded config");
        Ok(config)
    }

    /// Resolve the configuration to use.
    ///
    /// An explicit path must exist. Otherwise `srcmark.json` in `dir` is used
    /// when present, and defaults when not.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Config::load(path);
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Config::load(&candidate);
        }
        Ok(Config::default())
    }

    /// Check marker templates and output naming.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.markers.validate()?;
        self.output
            .validate()
            .map_err(|message| ConfigError::InvalidOutput { message })
    }

    /// Frontend options implied by this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            allow_syntax_errors: self.allow_syntax_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sig(name: &str, return_type: &str) -> FunctionSignature {
        FunctionSignature {
            name: name.to_string(),
            return_type: return_type.to_string(),
        }
    }

    mod templates {
        use super::*;

        #[test]
        fn default_function_markers() {
            let markers = MarkerSet::default();
            let s = sig("main", "int");
            assert_eq!(
                markers.function_open(Some(&s)),
                "// Begin function main returning int\n"
            );
            assert_eq!(markers.function_close(Some(&s)), "\n// End function main");
        }

        #[test]
        fn escaped_braces_are_literal() {
            let markers = MarkerSet {
                function_open: "/* {{{name}}} */".to_string(),
                ..MarkerSet::default()
            };
            markers.validate().unwrap();
            assert_eq!(markers.function_open(Some(&sig("f", "void"))), "/* {f} */");
        }

        #[test]
        fn unknown_placeholder_rejected() {
            let markers = MarkerSet {
                function_close: "// end {nmae}".to_string(),
                ..MarkerSet::default()
            };
            let err = markers.validate().unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidTemplate { ref marker, .. } if marker == "function_close"
            ));
            assert!(err.to_string().contains("{nmae}"));
        }

        #[test]
        fn conditional_markers_take_no_placeholders() {
            let markers = MarkerSet {
                if_open: "// if in {name}\n".to_string(),
                ..MarkerSet::default()
            };
            assert!(markers.validate().is_err());
        }

        #[test]
        fn unbalanced_braces_rejected() {
            for template in ["// {name", "// }"] {
                let markers = MarkerSet {
                    function_open: template.to_string(),
                    ..MarkerSet::default()
                };
                assert!(markers.validate().is_err(), "{template}");
            }
        }

        #[test]
        fn missing_signature_placeholders() {
            let markers = MarkerSet::default();
            assert_eq!(
                markers.function_open(None),
                "// Begin function <anonymous> returning <unknown>\n"
            );
        }
    }

    mod loading {
        use super::*;

        #[test]
        fn defaults_enable_every_rule() {
            let config = Config::default();
            assert_eq!(config.rules, vec![Rule::Conditional, Rule::Function]);
            assert_eq!(config.output.suffix, "M");
            assert!(!config.allow_syntax_errors);
        }

        #[test]
        fn partial_file_keeps_defaults() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("cfg.json");
            fs::write(&path, r#"{"rules": ["function"], "output": {"suffix": "_ann"}}"#).unwrap();
            let config = Config::load(&path).unwrap();
            assert_eq!(config.rules, vec![Rule::Function]);
            assert_eq!(config.output.suffix, "_ann");
            assert_eq!(config.markers, MarkerSet::default());
        }

        #[test]
        fn indentation_can_be_switched_off() {
            assert!(MarkerSet::default().indent_new_lines);
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("cfg.json");
            fs::write(&path, r#"{"markers": {"indent_new_lines": false}}"#).unwrap();
            let config = Config::load(&path).unwrap();
            assert!(!config.markers.indent_new_lines);
            assert_eq!(config.markers.if_open, MarkerSet::default().if_open);
        }

        #[test]
        fn unknown_key_rejected() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("cfg.json");
            fs::write(&path, r#"{"rulez": []}"#).unwrap();
            assert!(matches!(
                Config::load(&path),
                Err(ConfigError::Parse { .. })
            ));
        }

        #[test]
        fn empty_suffix_without_directory_rejected() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("cfg.json");
            fs::write(&path, r#"{"output": {"suffix": ""}}"#).unwrap();
            assert!(matches!(
                Config::load(&path),
                Err(ConfigError::InvalidOutput { .. })
            ));
        }

        #[test]
        fn discover_prefers_explicit_then_local_file() {
            let dir = TempDir::new().unwrap();
            assert_eq!(Config::discover(None, dir.path()).unwrap(), Config::default());

            fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"rules": []}"#).unwrap();
            assert!(Config::discover(None, dir.path()).unwrap().rules.is_empty());

            let missing = dir.path().join("missing.json");
            assert!(matches!(
                Config::discover(Some(&missing), dir.path()),
                Err(ConfigError::Read { .. })
            ));
        }
    }
}
