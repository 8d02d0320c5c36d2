use crate::cli::{Cli, OutputFormat};
use crate::error::{ConfigError, ConfigResult as Result};
use crate::validator::ValidatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ENGINE: &str = "XMLLINT_VALIDATE_ENGINE";
pub const ENV_FORMAT: &str = "XMLLINT_VALIDATE_FORMAT";
pub const ENV_TEMP_DIR: &str = "XMLLINT_VALIDATE_TEMP_DIR";
pub const ENV_TIMEOUT: &str = "XMLLINT_VALIDATE_TIMEOUT";

/// File names probed in the working directory, then in the user config dir
const CONFIG_FILE_NAMES: [&str; 3] = [
    "xmllint-validate.toml",
    ".xmllint-validate.toml",
    "xmllint-validate.json",
];

/// Where environment overrides come from
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Settings for one run, layered file, then environment, then flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub output: OutputConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable; bare names are resolved through PATH
    pub path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::engine::DEFAULT_ENGINE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormatConfig,
    pub verbose: bool,
    /// Print only the error table
    pub quiet: bool,
}

/// Per-call runtime settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Directory for temporary inputs read from stdin
    pub temp_dir: Option<PathBuf>,
    /// Abandon the engine after this many seconds
    pub timeout_seconds: Option<u64>,
}

/// On-disk spelling of [`OutputFormat`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    #[default]
    Human,
    Json,
}

impl OutputFormatConfig {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => Self::Human,
            OutputFormat::Json => Self::Json,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => Self::Human,
            OutputFormatConfig::Json => Self::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileFormat {
    Toml,
    Json,
    /// No extension: TOML is tried before JSON
    Unknown,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_string())),
            None => Ok(Self::Unknown),
        }
    }

    fn parse(self, content: &str) -> Result<Config> {
        match self {
            Self::Toml => Ok(toml::from_str(content)?),
            Self::Json => Ok(serde_json::from_str(content)?),
            Self::Unknown => match toml::from_str(content) {
                Ok(config) => Ok(config),
                Err(_) => Ok(serde_json::from_str(content)?),
            },
        }
    }
}

/// Resolves the effective [`Config`] for a CLI invocation
pub struct ConfigManager;

impl ConfigManager {
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    /// Full resolution with an explicit environment source
    ///
    /// An explicit `--config` replaces discovery entirely. The result is
    /// checked with [`ConfigManager::validate_config`] before returning.
    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let from_file = match &cli.config {
            Some(path) => Some(Self::load_from_file(path).await?),
            None => Self::find_config_file().await?,
        };

        let layered = match from_file {
            Some(file_config) => Self::merge_configs(Config::default(), file_config),
            None => Config::default(),
        };
        let layered = Self::apply_environment_overrides_with(env, layered)?;
        let config = Self::merge_with_cli(layered, cli);

        Self::validate_config(&config)?;
        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Parse a TOML or JSON file, chosen by extension
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let format = FileFormat::of(path)?;
        let content = tokio::fs::read_to_string(path).await?;
        format.parse(&content)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let local = CONFIG_FILE_NAMES.iter().map(PathBuf::from);
        let user = dirs::config_dir()
            .map(|dir| dir.join("xmllint-validate"))
            .into_iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)));
        local.chain(user).collect()
    }

    /// First existing file among the conventional locations, if any
    pub async fn find_config_file() -> Result<Option<Config>> {
        match Self::candidate_paths().into_iter().find(|path| path.exists()) {
            Some(path) => {
                log::debug!("Using configuration file {}", path.display());
                Ok(Some(Self::load_from_file(&path).await?))
            }
            None => Ok(None),
        }
    }

    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        let invalid = |key: &str, value: &str| {
            ConfigError::Environment(format!("Invalid {} value: {}", key, value))
        };

        if let Some(engine) = env.get(ENV_ENGINE) {
            config.engine.path = engine.into();
        }
        if let Some(value) = env.get(ENV_FORMAT) {
            config.output.format =
                OutputFormatConfig::parse(&value).ok_or_else(|| invalid(ENV_FORMAT, &value))?;
        }
        if let Some(temp_dir) = env.get(ENV_TEMP_DIR) {
            config.runtime.temp_dir = Some(temp_dir.into());
        }
        if let Some(value) = env.get(ENV_TIMEOUT) {
            let seconds = value
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(ENV_TIMEOUT, &value))?;
            config.runtime.timeout_seconds = Some(seconds);
        }

        Ok(config)
    }

    /// Overlay command-line flags; options left off the command line keep
    /// the value from lower layers
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(engine) = &cli.engine {
            config.engine.path = engine.clone();
        }
        if let Some(format) = cli.format {
            config.output.format = format.into();
        }
        if cli.verbose || cli.quiet {
            config.output.verbose = cli.verbose;
            config.output.quiet = cli.quiet;
        }
        config.runtime.temp_dir = cli.temp_dir.clone().or(config.runtime.temp_dir);
        config.runtime.timeout_seconds = cli.timeout.or(config.runtime.timeout_seconds);

        config
    }

    /// `overlay` wins for plain values; optional values only when set
    pub fn merge_configs(base: Config, overlay: Config) -> Config {
        Config {
            engine: overlay.engine,
            output: overlay.output,
            runtime: RuntimeConfig {
                temp_dir: overlay.runtime.temp_dir.or(base.runtime.temp_dir),
                timeout_seconds: overlay
                    .runtime
                    .timeout_seconds
                    .or(base.runtime.timeout_seconds),
            },
        }
    }

    pub fn validate_config(config: &Config) -> Result<()> {
        let problem = if config.engine.path.as_os_str().is_empty() {
            Some("Engine path must not be empty")
        } else if config.runtime.timeout_seconds == Some(0) {
            Some("Timeout must be at least one second")
        } else if config.output.verbose && config.output.quiet {
            Some("Verbose and quiet output are mutually exclusive")
        } else {
            None
        };

        match problem {
            Some(message) => Err(ConfigError::Validation(message.to_string())),
            None => Ok(()),
        }
    }

    /// Settings handed to the validation session
    pub fn validator_config(config: &Config) -> ValidatorConfig {
        ValidatorConfig {
            engine: config.engine.path.clone(),
            temp_dir: config.runtime.temp_dir.clone(),
        }
    }

    pub fn get_timeout_duration(config: &Config) -> Option<Duration> {
        config.runtime.timeout_seconds.map(Duration::from_secs)
    }
}
