//! Input materialization
//!
//! The engine only understands filesystem paths, so raw in-memory content is
//! written to a uniquely named temporary file for the duration of one call.
//! [`MaterializedInput`] owns that file and removes it on every exit path.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{Result, XmllintError};

/// Prefix for every temporary file this crate creates
pub const TEMP_FILE_PREFIX: &str = "xmllint-validate-";

/// Schema or document handed to a validation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationInput {
    /// Existing file; passed to the engine untouched
    Path(PathBuf),
    /// Raw bytes; written to a temporary file per call
    Content(Vec<u8>),
}

impl ValidationInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ValidationInput::Path(path.into())
    }

    pub fn content(bytes: impl Into<Vec<u8>>) -> Self {
        ValidationInput::Content(bytes.into())
    }

    pub fn is_content(&self) -> bool {
        matches!(self, ValidationInput::Content(_))
    }
}

impl From<PathBuf> for ValidationInput {
    fn from(path: PathBuf) -> Self {
        ValidationInput::Path(path)
    }
}

impl From<&Path> for ValidationInput {
    fn from(path: &Path) -> Self {
        ValidationInput::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ValidationInput {
    fn from(bytes: Vec<u8>) -> Self {
        ValidationInput::Content(bytes)
    }
}

impl From<&[u8]> for ValidationInput {
    fn from(bytes: &[u8]) -> Self {
        ValidationInput::Content(bytes.to_vec())
    }
}

impl From<String> for ValidationInput {
    fn from(text: String) -> Self {
        ValidationInput::Content(text.into_bytes())
    }
}

/// Which side of the validation an input plays; picks the temp file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    Schema,
    Document,
}

impl InputRole {
    fn extension(self) -> &'static str {
        match self {
            InputRole::Schema => "xsd",
            InputRole::Document => "xml",
        }
    }
}

/// Trait for abstracting the location of temporary files
pub trait TempDirProvider: Send + Sync {
    fn temp_dir(&self) -> PathBuf;
}

/// System temporary directory for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTempDir;

impl TempDirProvider for SystemTempDir {
    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}

/// Fixed directory, used for tests and the `temp_dir` config key
#[derive(Debug, Clone)]
pub struct FixedTempDir(pub PathBuf);

impl TempDirProvider for FixedTempDir {
    fn temp_dir(&self) -> PathBuf {
        self.0.clone()
    }
}

/// A path the engine can read for the duration of one call.
///
/// When `temporary` is set the file belongs to this value and is deleted by
/// [`MaterializedInput::cleanup`] or, failing that, on drop.
#[derive(Debug)]
pub struct MaterializedInput {
    path: PathBuf,
    temporary: bool,
}

impl MaterializedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Remove the temporary file now. Failures are logged, never returned.
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.temporary {
            return;
        }
        self.temporary = false;

        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed temporary input {}", self.path.display()),
            Err(e) => log::warn!(
                "Failed to remove temporary input {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for MaterializedInput {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Produce a readable path for `input`.
///
/// Paths pass through without touching the filesystem. Content is written
/// verbatim to `<temp_dir>/xmllint-validate-<uuid>.<ext>`; `create_new`
/// guarantees the name is not shared with any other call.
pub fn materialize(
    input: &ValidationInput,
    role: InputRole,
    temp: &dyn TempDirProvider,
) -> Result<MaterializedInput> {
    match input {
        ValidationInput::Path(path) => Ok(MaterializedInput {
            path: path.clone(),
            temporary: false,
        }),
        ValidationInput::Content(bytes) => {
            let path = temp.temp_dir().join(format!(
                "{}{}.{}",
                TEMP_FILE_PREFIX,
                Uuid::new_v4(),
                role.extension()
            ));

            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .map_err(|source| XmllintError::Materialize {
                    path: path.clone(),
                    source,
                })?;

            // From here on the guard owns the file, so a failed write still removes it
            let materialized = MaterializedInput {
                path,
                temporary: true,
            };

            file.write_all(bytes)
                .and_then(|()| file.flush())
                .map_err(|source| XmllintError::Materialize {
                    path: materialized.path.clone(),
                    source,
                })?;

            log::debug!(
                "Wrote {} bytes of {:?} content to {}",
                bytes.len(),
                role,
                materialized.path.display()
            );
            Ok(materialized)
        }
    }
}
