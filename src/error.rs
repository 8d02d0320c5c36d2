use std::path::PathBuf;

use thiserror::Error;

/// Main error type for everything that can stop a validation from running.
///
/// A document that fails schema validation is *not* an error: it comes back
/// as `Ok(ValidationResult::Invalid(..))`. Variants here mean the engine
/// could not be reached, could not be run, or was misconfigured.
#[derive(Error, Debug)]
pub enum XmllintError {
    #[error("Validation engine unavailable: {} - {reason}", engine.display())]
    EngineUnavailable { engine: PathBuf, reason: String },

    #[error("Failed to write temporary input {}", path.display())]
    Materialize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run validation engine {}", engine.display())]
    Spawn {
        engine: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl XmllintError {
    /// Errors raised while setting up a session: missing engine or bad config.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            XmllintError::EngineUnavailable { .. } | XmllintError::Config(_)
        )
    }

    /// Errors raised by a single validation call that never reached a verdict.
    pub fn is_invocation(&self) -> bool {
        matches!(
            self,
            XmllintError::Materialize { .. }
                | XmllintError::Spawn { .. }
                | XmllintError::Timeout { .. }
        )
    }
}

/// Configuration-specific error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

impl From<ConfigError> for XmllintError {
    fn from(err: ConfigError) -> Self {
        XmllintError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, XmllintError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
