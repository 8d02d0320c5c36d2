//! Output and Reporting
//!
//! Renders a [`ValidationResult`] either as a validity message / fixed-width
//! error table for people, or as a JSON report for tools.

use serde::Serialize;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::diagnostics::{ValidationError, ValidationResult};

const FILE_HEADER: &str = "FILE";
const LINE_HEADER: &str = "LINE";
const MESSAGE_HEADER: &str = "MESSAGE";

/// JSON shape of a validation report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub valid: bool,
    pub errors: &'a [ValidationError],
    pub unparsed: &'a [String],
    pub exit_code: Option<i32>,
}

impl<'a> From<&'a ValidationResult> for JsonReport<'a> {
    fn from(result: &'a ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => JsonReport {
                valid: true,
                errors: &[],
                unparsed: &[],
                exit_code: Some(0),
            },
            ValidationResult::Invalid(failure) => JsonReport {
                valid: false,
                errors: &failure.errors,
                unparsed: &failure.unparsed,
                exit_code: failure.exit_code,
            },
        }
    }
}

/// Output formatter for validation results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render `result` for `document`, the label shown in human output
    pub fn format_result(&self, document: &str, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => self.format_json(result),
            OutputFormat::Human => self.format_human(document, result),
        }
    }

    fn format_json(&self, result: &ValidationResult) -> String {
        let report = JsonReport::from(result);
        let rendered = if self.verbosity == VerbosityLevel::Verbose {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        // Plain strings, integers and bools cannot fail to serialize
        let mut rendered = rendered.unwrap_or_default();
        rendered.push('\n');
        rendered
    }

    fn format_human(&self, document: &str, result: &ValidationResult) -> String {
        let mut output = String::new();

        match result {
            ValidationResult::Valid => {
                if self.verbosity != VerbosityLevel::Quiet {
                    output.push_str(&format!(
                        "{} {}\n",
                        document,
                        self.colorize("validates", "32")
                    ));
                }
            }
            ValidationResult::Invalid(failure) => {
                if !failure.errors.is_empty() {
                    output.push_str(&format_table(&failure.errors));
                }

                if self.verbosity == VerbosityLevel::Quiet {
                    return output;
                }

                if failure.is_unparsed() {
                    output.push_str(&format!(
                        "{} {} (no structured diagnostics)\n",
                        document,
                        self.colorize("fails to validate", "31")
                    ));
                } else {
                    let count = failure.errors.len();
                    output.push_str(&format!(
                        "{} {} with {} error{}\n",
                        document,
                        self.colorize("fails to validate", "31"),
                        count,
                        if count == 1 { "" } else { "s" }
                    ));
                }

                if failure.is_unparsed() || self.verbosity == VerbosityLevel::Verbose {
                    for line in &failure.unparsed {
                        output.push_str(&format!("  {}\n", line));
                    }
                }

                if self.verbosity == VerbosityLevel::Verbose {
                    match failure.exit_code {
                        Some(code) => output.push_str(&format!("Engine exit code: {}\n", code)),
                        None => output.push_str("Engine terminated by signal\n"),
                    }
                }
            }
        }

        output
    }
}

/// Fixed-width table with FILE, LINE and MESSAGE columns
pub fn format_table(errors: &[ValidationError]) -> String {
    let file_width = errors
        .iter()
        .map(|e| e.file.chars().count())
        .chain(std::iter::once(FILE_HEADER.len()))
        .max()
        .unwrap_or(FILE_HEADER.len());
    let line_width = errors
        .iter()
        .map(|e| e.line.to_string().len())
        .chain(std::iter::once(LINE_HEADER.len()))
        .max()
        .unwrap_or(LINE_HEADER.len());

    let mut output = String::new();
    output.push_str(&format!(
        "{:<file_width$}  {:>line_width$}  {}\n",
        FILE_HEADER, LINE_HEADER, MESSAGE_HEADER
    ));
    output.push_str(&format!(
        "{}  {}  {}\n",
        "-".repeat(file_width),
        "-".repeat(line_width),
        "-".repeat(MESSAGE_HEADER.len())
    ));
    for error in errors {
        output.push_str(&format!(
            "{:<file_width$}  {:>line_width$}  {}\n",
            error.file, error.line, error.message
        ));
    }
    output
}
