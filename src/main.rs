use std::process::ExitCode;

use anyhow::Context;
use tokio::io::AsyncReadExt;

use xmllint_validate::{
    Cli, ConfigError, ConfigManager, Output, ValidationResult, VerbosityLevel, XmlValidator,
    XmllintError,
};

const EXIT_INVALID: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_CONFIGURATION: u8 = 3;
const EXIT_INVOCATION: u8 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.verbosity().log_filter()),
    )
    .init();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::from(EXIT_USAGE);
    }

    match run(&cli).await {
        Ok(result) if result.is_valid() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_INVALID),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ValidationResult> {
    let config = ConfigManager::load_config(cli).await?;

    let mut stdin = if cli.reads_stdin() {
        let mut buffer = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buffer)
            .await
            .context("Failed to read input from stdin")?;
        Some(buffer)
    } else {
        None
    };

    let schema = Cli::input_for(&cli.schema, &mut stdin);
    let document = Cli::input_for(&cli.document, &mut stdin);

    let validator =
        XmlValidator::with_config(schema, document, ConfigManager::validator_config(&config))?;

    let result = match ConfigManager::get_timeout_duration(&config) {
        Some(timeout) => tokio::time::timeout(timeout, validator.validate())
            .await
            .map_err(|_| XmllintError::Timeout {
                seconds: timeout.as_secs(),
            })??,
        None => validator.validate().await?,
    };

    let output = Output::new(
        VerbosityLevel::from_flags(config.output.verbose, config.output.quiet),
        config.output.format.into(),
    );
    print!("{}", output.format_result(&cli.document_label(), &result));

    Ok(result)
}

fn exit_code_for(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<ConfigError>().is_some() {
        return EXIT_CONFIGURATION;
    }
    match error.downcast_ref::<XmllintError>() {
        Some(e) if e.is_configuration() => EXIT_CONFIGURATION,
        _ => EXIT_INVOCATION,
    }
}
