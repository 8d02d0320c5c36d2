//! Diagnostic normalization
//!
//! Turns the engine's line-oriented error stream into structured records.
//! xmllint reports one problem per line as `<file>:<line>: <message>`; any
//! other line (the trailing `<file> fails to validate`, warnings, banners) is
//! kept aside as unparsed text rather than turned into a fabricated record.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::EngineOutput;

static DIAGNOSTIC_REGEX: OnceLock<Regex> = OnceLock::new();

/// `<file>:<digits>: <message>`, where `<file>` stops at the first `:<digits>:`.
/// Only ASCII digits form a line marker.
fn get_diagnostic_regex() -> &'static Regex {
    DIAGNOSTIC_REGEX.get_or_init(|| {
        Regex::new(r"^(.*?):([0-9]+): ?(.*)$").expect("Failed to compile diagnostic regex")
    })
}

/// One diagnostic emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationError {
    pub file: String,
    pub line: u64,
    pub message: String,
}

impl ValidationError {
    pub fn new(file: impl Into<String>, line: u64, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// A record carrying neither a file nor a message tells the caller nothing
    pub fn is_blank(&self) -> bool {
        self.file.is_empty() && self.message.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// Details of a run in which the engine rejected the document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Structured diagnostics, in the order the engine emitted them
    pub errors: Vec<ValidationError>,
    /// Non-empty lines that did not match the diagnostic format
    pub unparsed: Vec<String>,
    pub exit_code: Option<i32>,
}

impl ValidationFailure {
    /// The engine failed but nothing structured could be extracted
    pub fn is_unparsed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of one validation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationResult {
    /// The document conforms to the schema
    Valid,
    /// The engine ran and reported the document as non-conforming
    Invalid(ValidationFailure),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid(_))
    }

    /// Structured errors; empty for `Valid`
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(failure) => &failure.errors,
        }
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(failure) => Some(failure),
        }
    }
}

/// Parse a single diagnostic line. Non-matching lines yield the blank record.
pub fn parse_line(line: &str) -> ValidationError {
    let Some(caps) = get_diagnostic_regex().captures(line) else {
        return ValidationError::default();
    };

    // Digit runs too long for u64 cannot be a real line number
    let Ok(line_number) = caps[2].parse::<u64>() else {
        return ValidationError::default();
    };

    ValidationError {
        file: caps[1].to_string(),
        line: line_number,
        message: caps[3].trim_end().to_string(),
    }
}

fn diagnostic_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
}

/// Parse every line of `text`, dropping blank records and keeping order
pub fn parse_diagnostics(text: &str) -> Vec<ValidationError> {
    diagnostic_lines(text)
        .map(parse_line)
        .filter(|record| !record.is_blank())
        .collect()
}

/// Decide the outcome of an engine run.
///
/// The exit status is authoritative: xmllint exits 0 for a valid document
/// (and still writes `<file> validates` to stderr). A non-zero exit is always
/// `Invalid`, even when no line could be structured or the stream was empty.
pub fn interpret(output: &EngineOutput) -> ValidationResult {
    log::trace!("Engine diagnostics: {:?}", output.stderr);

    if output.success {
        return ValidationResult::Valid;
    }

    let mut errors = Vec::new();
    let mut unparsed = Vec::new();
    for line in diagnostic_lines(&output.stderr) {
        let record = parse_line(line);
        if record.is_blank() {
            unparsed.push(line.trim().to_string());
        } else {
            errors.push(record);
        }
    }

    if errors.is_empty() {
        log::debug!(
            "Engine exited with {:?} but produced no structured diagnostics",
            output.exit_code
        );
    }

    ValidationResult::Invalid(ValidationFailure {
        errors,
        unparsed,
        exit_code: output.exit_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGE_DIAGNOSTICS: &str = "doc.xml:4: element age: Schemas validity error : Element 'age': 'abc' is not a valid value of the atomic type 'xs:integer'.\ndoc.xml fails to validate\n";

    #[test]
    fn test_parse_line_xmllint_format() {
        let record = parse_line(
            "doc.xml:4: element age: Schemas validity error : Element 'age': 'abc' is not a valid value of the atomic type 'xs:integer'.",
        );

        assert_eq!(record.file, "doc.xml");
        assert_eq!(record.line, 4);
        assert!(record.message.starts_with("element age: Schemas validity error"));
        assert!(record.message.ends_with("'xs:integer'."));
    }

    #[test]
    fn test_parse_line_file_stops_at_first_line_marker() {
        let record = parse_line("/tmp/a:b/doc.xml:12: message with 99: inside");
        assert_eq!(record.file, "/tmp/a:b/doc.xml");
        assert_eq!(record.line, 12);
        assert_eq!(record.message, "message with 99: inside");

        let windows = parse_line(r"C:\work\doc.xml:7: bad element");
        assert_eq!(windows.file, r"C:\work\doc.xml");
        assert_eq!(windows.line, 7);
    }

    #[test]
    fn test_parse_line_non_matching_is_blank() {
        assert!(parse_line("WARNING: something unrelated").is_blank());
        assert!(parse_line("doc.xml fails to validate").is_blank());
        assert!(parse_line("doc.xml:abc: not a line number").is_blank());
        assert_eq!(parse_line("no colon here"), ValidationError::default());
    }

    #[test]
    fn test_parse_line_keeps_partial_records() {
        let no_file = parse_line(":3: message without file");
        assert_eq!(no_file.file, "");
        assert_eq!(no_file.line, 3);
        assert!(!no_file.is_blank());

        let no_message = parse_line("doc.xml:3: ");
        assert_eq!(no_message.file, "doc.xml");
        assert_eq!(no_message.message, "");
        assert!(!no_message.is_blank());
    }

    #[test]
    fn test_parse_line_rejects_overflowing_line_number() {
        assert!(parse_line("doc.xml:99999999999999999999999: huge").is_blank());
    }

    #[test]
    fn test_parse_line_non_ascii_digits_are_part_of_file() {
        assert_eq!(
            parse_line("doc:٣:x.xml:5: real message"),
            ValidationError::new("doc:٣:x.xml", 5, "real message")
        );
        assert!(parse_line("doc.xml:٣: arabic-indic line").is_blank());
    }

    #[test]
    fn test_parse_diagnostics_filters_and_orders() {
        let text = "doc.xml:2: first\n\nWARNING: something unrelated\r\ndoc.xml:9: second\r\n   \ndoc.xml fails to validate\n";
        let errors = parse_diagnostics(text);

        assert_eq!(
            errors,
            vec![
                ValidationError::new("doc.xml", 2, "first"),
                ValidationError::new("doc.xml", 9, "second"),
            ]
        );
    }

    #[test]
    fn test_parse_diagnostics_unrelated_warning_gives_empty_list() {
        assert!(parse_diagnostics("WARNING: something unrelated").is_empty());
        assert!(parse_diagnostics("").is_empty());
        assert!(parse_diagnostics("  \n\t\n").is_empty());
    }

    #[test]
    fn test_interpret_success_ignores_validates_banner() {
        let output = EngineOutput::new(0, "doc.xml validates\n");
        assert_eq!(interpret(&output), ValidationResult::Valid);
    }

    #[test]
    fn test_interpret_failure_with_diagnostics() {
        let output = EngineOutput::new(3, AGE_DIAGNOSTICS);
        let result = interpret(&output);

        assert!(result.is_invalid());
        let failure = result.failure().unwrap();
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(failure.errors[0].file, "doc.xml");
        assert_eq!(failure.errors[0].line, 4);
        assert!(failure.errors[0].message.contains("'abc'"));
        assert_eq!(failure.unparsed, vec!["doc.xml fails to validate"]);
        assert_eq!(failure.exit_code, Some(3));
        assert!(!failure.is_unparsed());
    }

    #[test]
    fn test_interpret_failure_without_text_is_not_success() {
        let output = EngineOutput::new(3, "   \n");
        let result = interpret(&output);

        let failure = result.failure().expect("non-zero exit must not be Valid");
        assert!(failure.is_unparsed());
        assert!(failure.unparsed.is_empty());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_interpret_failure_with_only_unparseable_lines() {
        let output = EngineOutput::new(1, "WARNING: something unrelated\n");
        let result = interpret(&output);

        let failure = result.failure().unwrap();
        assert!(failure.errors.is_empty());
        assert!(failure.is_unparsed());
        assert_eq!(failure.unparsed, vec!["WARNING: something unrelated"]);
    }

    #[test]
    fn test_interpret_signal_termination() {
        let output = EngineOutput {
            exit_code: None,
            success: false,
            stderr: String::new(),
        };
        let failure = interpret(&output).failure().cloned().unwrap();
        assert_eq!(failure.exit_code, None);
    }

    #[test]
    fn test_validation_error_display_and_json() {
        let error = ValidationError::new("doc.xml", 4, "bad value");
        assert_eq!(error.to_string(), "doc.xml:4: bad value");

        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["file"], "doc.xml");
        assert_eq!(json["line"], 4);
        assert_eq!(json["message"], "bad value");
    }
}
