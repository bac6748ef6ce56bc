//! Output path policy.
//!
//! The annotated copy of `dir/name.ext` is written next to it as
//! `dir/name{suffix}.ext`, or into a separate directory when one is configured.
//! With the default suffix `M`, `src/main.c` becomes `src/mainM.c`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default marker inserted before the file extension.
pub const DEFAULT_SUFFIX: &str = "M";

/// Errors from deriving an output path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// The input path has no file name component.
    #[error("input path has no file name: {path}")]
    NoFileName { path: PathBuf },

    /// The derived path would overwrite the input.
    #[error("output path would overwrite the input: {path}")]
    OverwritesInput { path: PathBuf },
}

/// How output files are named and placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputNaming {
    /// Text inserted between the file stem and its extension.
    pub suffix: String,
    /// Directory for outputs; `None` writes next to the input.
    pub directory: Option<PathBuf>,
}

impl Default for OutputNaming {
    fn default() -> Self {
        OutputNaming {
            suffix: DEFAULT_SUFFIX.to_string(),
            directory: None,
        }
    }
}

impl OutputNaming {
    /// Reject configurations that map an input onto itself.
    pub fn validate(&self) -> Result<(), String> {
        if self.suffix.is_empty() && self.directory.is_none() {
            return Err("output suffix is empty and no output directory is set".to_string());
        }
        if self.suffix.contains(['/', '\\']) {
            return Err(format!(
                "output suffix '{}' must not contain path separators",
                self.suffix
            ));
        }
        Ok(())
    }

    /// Derive the output path for `input`.
    ///
    /// The suffix goes before the last extension of the file name only, so
    /// dots in directory names are never touched. A file without an extension
    /// (or a dotfile like `.profile`) gets the suffix appended.
    pub fn output_path(&self, input: &Path) -> Result<PathBuf, NamingError> {
        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NamingError::NoFileName {
                path: input.to_path_buf(),
            })?;

        let renamed = match file_name.rfind('.') {
            Some(dot) if dot > 0 => format!(
                "{}{}{}",
                &file_name[..dot],
                self.suffix,
                &file_name[dot..]
            ),
            _ => format!("{}{}", file_name, self.suffix),
        };

        let output = match &self.directory {
            Some(dir) => dir.join(renamed),
            None => input.with_file_name(renamed),
        };

        if output == input {
            return Err(NamingError::OverwritesInput { path: output });
        }
        Ok(output)
    }
}
