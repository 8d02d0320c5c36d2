//! Validation sessions
//!
//! An [`XmlValidator`] binds a schema and a document to a verified engine.
//! Both execution modes go through the same routine:
//!
//! - **Materialize**: raw-content inputs become uniquely named temp files
//! - **Invoke**: one `xmllint --noout --schema` subprocess
//! - **Interpret**: exit status and error stream become a [`ValidationResult`]
//! - **Cleanup**: temp files are removed whatever happened above
//!
//! The modes differ only in the [`EngineRunner`] handed to that routine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::{ValidationResult, interpret};
use crate::engine::{
    BlockingRunner, DEFAULT_ENGINE, EngineCommand, EngineRunner, TokioRunner, check_availability,
};
use crate::error::{Result, XmllintError};
use crate::input::{
    FixedTempDir, InputRole, SystemTempDir, TempDirProvider, ValidationInput, materialize,
};

/// Settings for a validation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Engine executable, resolved through `PATH` when bare
    pub engine: PathBuf,
    /// Directory for raw-content inputs; the system temp dir when `None`
    pub temp_dir: Option<PathBuf>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            engine: PathBuf::from(DEFAULT_ENGINE),
            temp_dir: None,
        }
    }
}

/// Builder for [`XmlValidator`] with injectable collaborators
pub struct XmlValidatorBuilder {
    schema: ValidationInput,
    document: ValidationInput,
    engine: PathBuf,
    temp_dir: Option<Arc<dyn TempDirProvider>>,
    runner: Option<Arc<dyn EngineRunner>>,
}

impl XmlValidatorBuilder {
    pub fn engine(mut self, engine: impl Into<PathBuf>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn temp_dir(mut self, provider: Arc<dyn TempDirProvider>) -> Self {
        self.temp_dir = Some(provider);
        self
    }

    /// Use `runner` for both execution modes instead of the real subprocess runners
    pub fn runner(mut self, runner: Arc<dyn EngineRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Verify the engine and produce the session. Fails without a validator
    /// when the engine cannot be executed.
    pub fn build(self) -> Result<XmlValidator> {
        let engine_version = check_availability(&self.engine)?;

        Ok(XmlValidator {
            schema: self.schema,
            document: self.document,
            engine: self.engine,
            engine_version,
            temp_dir: self.temp_dir.unwrap_or_else(|| Arc::new(SystemTempDir)),
            runner: self.runner,
        })
    }
}

/// A schema/document pair bound to an available validation engine
pub struct XmlValidator {
    schema: ValidationInput,
    document: ValidationInput,
    engine: PathBuf,
    engine_version: String,
    temp_dir: Arc<dyn TempDirProvider>,
    runner: Option<Arc<dyn EngineRunner>>,
}

impl XmlValidator {
    /// Create a session using `xmllint` from `PATH` and the system temp dir
    pub fn new(
        schema: impl Into<ValidationInput>,
        document: impl Into<ValidationInput>,
    ) -> Result<Self> {
        Self::builder(schema, document).build()
    }

    pub fn with_config(
        schema: impl Into<ValidationInput>,
        document: impl Into<ValidationInput>,
        config: ValidatorConfig,
    ) -> Result<Self> {
        let mut builder = Self::builder(schema, document).engine(config.engine);
        if let Some(dir) = config.temp_dir {
            builder = builder.temp_dir(Arc::new(FixedTempDir(dir)));
        }
        builder.build()
    }

    pub fn builder(
        schema: impl Into<ValidationInput>,
        document: impl Into<ValidationInput>,
    ) -> XmlValidatorBuilder {
        XmlValidatorBuilder {
            schema: schema.into(),
            document: document.into(),
            engine: PathBuf::from(DEFAULT_ENGINE),
            temp_dir: None,
            runner: None,
        }
    }

    /// Validate, suspending the current task only while the engine runs
    pub async fn validate(&self) -> Result<ValidationResult> {
        match &self.runner {
            Some(runner) => self.run_with(runner.as_ref()).await,
            None => self.run_with(&TokioRunner).await,
        }
    }

    /// Validate, blocking the calling thread until the engine exits
    pub fn validate_blocking(&self) -> Result<ValidationResult> {
        match &self.runner {
            Some(runner) => futures::executor::block_on(self.run_with(runner.as_ref())),
            None => futures::executor::block_on(self.run_with(&BlockingRunner)),
        }
    }

    /// Shared pipeline behind both execution modes
    async fn run_with(&self, runner: &dyn EngineRunner) -> Result<ValidationResult> {
        // Guards remove their temp files on drop, including on the early returns below
        let schema = materialize(&self.schema, InputRole::Schema, self.temp_dir.as_ref())?;
        let document = materialize(&self.document, InputRole::Document, self.temp_dir.as_ref())?;

        let command = EngineCommand::new(&self.engine, schema.path(), document.path());
        log::debug!("Running {}", command);

        let outcome = runner.run(&command).await;

        schema.cleanup();
        document.cleanup();

        let output = outcome.map_err(|source| XmllintError::Spawn {
            engine: self.engine.clone(),
            source,
        })?;
        log::debug!("Engine exited with {:?}", output.exit_code);

        Ok(interpret(&output))
    }

    pub fn schema(&self) -> &ValidationInput {
        &self.schema
    }

    pub fn document(&self) -> &ValidationInput {
        &self.document
    }

    pub fn engine(&self) -> &Path {
        &self.engine
    }

    /// Version reported by the engine during the availability check
    pub fn engine_version(&self) -> &str {
        &self.engine_version
    }
}
