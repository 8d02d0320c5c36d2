//! External validation engine
//!
//! Everything that touches the `xmllint` subprocess lives here: the
//! availability check run at session construction, the argument vector for a
//! validation run, and the two ways of waiting for the child to finish.
//!
//! Commands are always executed from an argument vector. No shell is ever
//! involved, so paths containing spaces or metacharacters reach the engine
//! verbatim.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::{Result, XmllintError};

/// Engine looked up on `PATH` when nothing else is configured
pub const DEFAULT_ENGINE: &str = "xmllint";

static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_version_regex() -> &'static Regex {
    VERSION_REGEX.get_or_init(|| {
        Regex::new(r"using libxml version (\S+)").expect("Failed to compile version regex")
    })
}

/// One validation run: `<engine> --noout --schema <schema> <document>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl EngineCommand {
    pub fn new(engine: &Path, schema: &Path, document: &Path) -> Self {
        Self {
            program: engine.to_path_buf(),
            args: vec![
                OsString::from("--noout"),
                OsString::from("--schema"),
                schema.as_os_str().to_os_string(),
                document.as_os_str().to_os_string(),
            ],
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    fn std_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }

    fn tokio_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}

/// What the engine left behind: its exit status and error stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineOutput {
    /// `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stderr: String,
}

impl EngineOutput {
    pub fn new(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            success: exit_code == 0,
            stderr: stderr.into(),
        }
    }
}

impl From<Output> for EngineOutput {
    fn from(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            success: output.status.success(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// How a caller waits for the engine to finish.
///
/// The validator pipeline is written once against this trait; the execution
/// mode is chosen purely by which runner is handed to it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineRunner: Send + Sync {
    /// Spawn `command` and wait for it. `Err` means the child never ran.
    async fn run(&self, command: &EngineCommand) -> std::io::Result<EngineOutput>;
}

/// Suspending mode: only the awaiting task yields while the child runs
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

#[async_trait]
impl EngineRunner for TokioRunner {
    async fn run(&self, command: &EngineCommand) -> std::io::Result<EngineOutput> {
        let output = command.tokio_command().output().await?;
        Ok(output.into())
    }
}

/// Blocking mode: the calling thread is held until the child exits
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingRunner;

#[async_trait]
impl EngineRunner for BlockingRunner {
    async fn run(&self, command: &EngineCommand) -> std::io::Result<EngineOutput> {
        let output = command.std_command().output()?;
        Ok(output.into())
    }
}

/// Confirm the engine can be executed by asking for its version.
///
/// Returns the version string reported by the engine, or the first line of
/// its banner if the format is unfamiliar.
pub fn check_availability(engine: &Path) -> Result<String> {
    let output = std::process::Command::new(engine)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| XmllintError::EngineUnavailable {
            engine: engine.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(XmllintError::EngineUnavailable {
            engine: engine.to_path_buf(),
            reason: format!("`--version` exited with {}", output.status),
        });
    }

    // xmllint prints its banner on stderr; other builds may use stdout
    let mut banner = String::from_utf8_lossy(&output.stderr).into_owned();
    banner.push_str(&String::from_utf8_lossy(&output.stdout));

    let version = parse_version(&banner);
    log::debug!("Validation engine {} version {}", engine.display(), version);
    Ok(version)
}

fn parse_version(banner: &str) -> String {
    if let Some(caps) = get_version_regex().captures(banner) {
        return caps[1].to_string();
    }
    banner
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_arguments() {
        let command = EngineCommand::new(
            Path::new("xmllint"),
            Path::new("/tmp/schema.xsd"),
            Path::new("/tmp/doc.xml"),
        );

        assert_eq!(command.program(), Path::new("xmllint"));
        assert_eq!(
            command.args(),
            &[
                OsString::from("--noout"),
                OsString::from("--schema"),
                OsString::from("/tmp/schema.xsd"),
                OsString::from("/tmp/doc.xml"),
            ]
        );
    }

    #[test]
    fn test_command_keeps_hostile_paths_as_single_arguments() {
        let document = Path::new("/tmp/my docs/$(rm -rf ~); echo.xml");
        let command = EngineCommand::new(
            Path::new("xmllint"),
            Path::new("/tmp/a b.xsd"),
            document,
        );

        assert_eq!(command.args().len(), 4);
        assert_eq!(command.args()[2], OsString::from("/tmp/a b.xsd"));
        assert_eq!(command.args()[3].as_os_str(), document.as_os_str());
    }

    #[test]
    fn test_command_display() {
        let command = EngineCommand::new(
            Path::new("xmllint"),
            Path::new("s.xsd"),
            Path::new("d.xml"),
        );
        assert_eq!(
            command.to_string(),
            r#"xmllint "--noout" "--schema" "s.xsd" "d.xml""#
        );
    }

    #[test]
    fn test_engine_output_constructor() {
        let ok = EngineOutput::new(0, "");
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));

        let failed = EngineOutput::new(3, "doc.xml fails to validate\n");
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(3));
    }

    #[test]
    fn test_parse_version() {
        let banner = "xmllint: using libxml version 20914\n   compiled with: Threads Tree Output\n";
        assert_eq!(parse_version(banner), "20914");

        assert_eq!(parse_version("\n  custom-engine 1.2\n"), "custom-engine 1.2");
        assert_eq!(parse_version(""), "unknown");
    }

    #[test]
    fn test_missing_engine_is_unavailable() {
        let err = check_availability(Path::new("/nonexistent/bin/xmllint-missing")).unwrap_err();
        assert!(matches!(err, XmllintError::EngineUnavailable { .. }));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_runners_report_spawn_failure() {
        let command = EngineCommand::new(
            Path::new("/nonexistent/bin/xmllint-missing"),
            Path::new("s.xsd"),
            Path::new("d.xml"),
        );

        assert!(TokioRunner.run(&command).await.is_err());
        assert!(BlockingRunner.run(&command).await.is_err());
    }
}
