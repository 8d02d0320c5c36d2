//! # xmllint-validate Library
//!
//! Validate an XML document against an XSD schema by running `xmllint`, and
//! turn its diagnostics into structured `{file, line, message}` records.
//! Schema and document may each be given as a path or as raw bytes.
//!
//! ```no_run
//! use xmllint_validate::{ValidationInput, ValidationResult, XmlValidator};
//!
//! # fn main() -> xmllint_validate::Result<()> {
//! let validator = XmlValidator::new(
//!     ValidationInput::path("person.xsd"),
//!     ValidationInput::content(b"<age>abc</age>".to_vec()),
//! )?;
//!
//! match validator.validate_blocking()? {
//!     ValidationResult::Valid => println!("valid"),
//!     ValidationResult::Invalid(failure) => {
//!         for error in &failure.errors {
//!             println!("{}:{}: {}", error.file, error.line, error.message);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod validator;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigManager, EnvProvider, SystemEnvProvider};
pub use diagnostics::{
    ValidationError, ValidationFailure, ValidationResult, interpret, parse_diagnostics, parse_line,
};
pub use engine::{
    BlockingRunner, DEFAULT_ENGINE, EngineCommand, EngineOutput, EngineRunner, TokioRunner,
    check_availability,
};
pub use error::{ConfigError, Result, XmllintError};
pub use input::{
    FixedTempDir, InputRole, MaterializedInput, SystemTempDir, TEMP_FILE_PREFIX, TempDirProvider,
    ValidationInput, materialize,
};
pub use output::Output;
pub use validator::{ValidatorConfig, XmlValidator, XmlValidatorBuilder};
