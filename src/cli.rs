use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::input::ValidationInput;

/// Positional argument meaning "read this input from stdin"
pub const STDIN_ARG: &str = "-";

/// How much the binary prints besides the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Error table only; a valid document prints nothing
    Quiet,
    #[default]
    Normal,
    /// Adds the engine exit code and debug logging
    Verbose,
}

impl VerbosityLevel {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            VerbosityLevel::Quiet
        } else if verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default `env_logger` filter for this verbosity; `RUST_LOG` still wins
    pub fn log_filter(self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Validity message or a table of errors
    Human,
    /// Machine-readable JSON report
    Json,
}

/// Validate an XML document against an XSD schema using xmllint
#[derive(Parser, Debug, Clone)]
#[command(name = "xmllint-validate")]
#[command(about = "Validate an XML document against an XSD schema and report structured errors")]
#[command(version)]
pub struct Cli {
    /// XSD schema file, or `-` to read it from stdin
    pub schema: PathBuf,

    /// XML document file, or `-` to read it from stdin
    pub document: PathBuf,

    /// Validation engine executable
    #[arg(long = "engine", help = "Path to the xmllint executable [default: xmllint]")]
    pub engine: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory for temporary copies of stdin input
    #[arg(long = "temp-dir")]
    pub temp_dir: Option<PathBuf>,

    /// Give up on the engine after this many seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Show the engine exit code and debug logs
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Print only the error table
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if is_stdin(&self.schema) && is_stdin(&self.document) {
            return Err(
                "Only one of the schema and the document can be read from stdin".to_string(),
            );
        }
        if let Some(timeout) = self.timeout
            && timeout == 0
        {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        VerbosityLevel::from_flags(self.verbose, self.quiet)
    }

    /// Build the session input for `arg`, taking `stdin` content for `-`
    pub fn input_for(arg: &Path, stdin: &mut Option<Vec<u8>>) -> ValidationInput {
        if is_stdin(arg) {
            ValidationInput::Content(stdin.take().unwrap_or_default())
        } else {
            ValidationInput::Path(arg.to_path_buf())
        }
    }

    /// Whether any positional argument asks for stdin
    pub fn reads_stdin(&self) -> bool {
        is_stdin(&self.schema) || is_stdin(&self.document)
    }

    /// Name shown for the document in human output
    pub fn document_label(&self) -> String {
        if is_stdin(&self.document) {
            "<stdin>".to_string()
        } else {
            self.document.display().to_string()
        }
    }
}

fn is_stdin(arg: &Path) -> bool {
    arg.as_os_str() == STDIN_ARG
}
