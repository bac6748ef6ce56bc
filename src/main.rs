//! Binary entry point for the srcmark CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Annotate files (writes fooM.c next to foo.c)
//! srcmark annotate src/foo.c src/bar.c
//!
//! # Report the markers without writing anything
//! srcmark annotate --dry-run src/foo.c
//!
//! # Print the annotated text of one file
//! srcmark annotate --stdout src/foo.c
//!
//! # Only function markers, outputs into another directory
//! srcmark annotate --rule function --out-dir annotated src/*.c
//!
//! # Show the syntax tree
//! srcmark dump src/foo.c
//! ```

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use srcmark::cli::{run_annotate, run_annotate_to_stdout, run_dump};
use srcmark::config::Config;
use srcmark::error::{OutputErrorCode, SrcmarkError};
use srcmark::output::{emit_response, ErrorResponse};
use srcmark::policy::Rule;

// ============================================================================
// CLI Structure
// ============================================================================

/// Insert marker comments around C functions and conditionals.
///
/// Output is JSON unless `--stdout` or `dump` is used.
#[derive(Parser, Debug)]
#[command(
    name = "srcmark",
    version,
    about = "Insert marker comments around C functions and conditionals"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: ./srcmark.json when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate C source files.
    Annotate {
        /// Input files, processed in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Compute and report markers without writing files.
        #[arg(long)]
        dry_run: bool,

        /// Print the annotated text of a single file instead of JSON.
        #[arg(long, conflicts_with = "dry_run")]
        stdout: bool,

        /// Text inserted before the output file's extension.
        #[arg(long)]
        suffix: Option<String>,

        /// Directory to write outputs into.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Rule to apply; repeat for several (default: all).
        #[arg(long = "rule", value_enum)]
        rules: Vec<Rule>,

        /// Annotate files that have syntax errors.
        #[arg(long)]
        allow_syntax_errors: bool,

        /// Insert markers exactly as configured, without re-indenting their lines.
        #[arg(long)]
        no_indent: bool,
    },
    /// Print the syntax tree of a C source file.
    Dump {
        /// Input file.
        file: PathBuf,

        /// Dump files that have syntax errors.
        #[arg(long)]
        allow_syntax_errors: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(output) => {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(output.as_bytes());
            let _ = stdout.flush();
            ExitCode::SUCCESS
        }
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like successful responses
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command and return what to print.
fn execute(cli: Cli) -> Result<String, SrcmarkError> {
    let mut config = load_config(&cli.global)?;
    match cli.command {
        Command::Annotate {
            files,
            dry_run,
            stdout,
            suffix,
            out_dir,
            rules,
            allow_syntax_errors,
            no_indent,
        } => {
            if no_indent {
                config.markers.indent_new_lines = false;
            }
            apply_overrides(&mut config, suffix, out_dir, rules, allow_syntax_errors)?;
            if stdout {
                let [file] = files.as_slice() else {
                    return Err(SrcmarkError::invalid_args(
                        "--stdout takes exactly one input file",
                    ));
                };
                return run_annotate_to_stdout(file, &config);
            }
            let json = run_annotate(&files, &config, dry_run)?;
            Ok(json + "\n")
        }
        Command::Dump {
            file,
            allow_syntax_errors,
        } => {
            config.allow_syntax_errors |= allow_syntax_errors;
            run_dump(&file, &config)
        }
    }
}

/// Resolve the configuration file.
fn load_config(global: &GlobalArgs) -> Result<Config, SrcmarkError> {
    let cwd = env::current_dir()
        .map_err(|e| SrcmarkError::internal(format!("cannot determine current directory: {}", e)))?;
    Ok(Config::discover(global.config.as_deref(), &cwd)?)
}

/// Command-line flags win over the configuration file.
fn apply_overrides(
    config: &mut Config,
    suffix: Option<String>,
    out_dir: Option<PathBuf>,
    rules: Vec<Rule>,
    allow_syntax_errors: bool,
) -> Result<(), SrcmarkError> {
    if let Some(suffix) = suffix {
        config.output.suffix = suffix;
    }
    if out_dir.is_some() {
        config.output.directory = out_dir;
    }
    if !rules.is_empty() {
        config.rules = rules;
    }
    config.allow_syntax_errors |= allow_syntax_errors;
    Ok(config.validate()?)
}
