//! Result and error types for coverage sessions.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while accumulating coverage
///
/// None of these are retried: a deterministic parse, merge or tool failure
/// produces the same outcome on every attempt.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A report line does not split into status, line number and text
    #[error("Malformed report {path} (line {line}): {reason}")]
    MalformedReport {
        /// Report file being parsed
        path: PathBuf,
        /// 1-based line within the report file
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Two reports for the same unit disagree on their line table
    #[error("Line table mismatch for {unit}: {reason}")]
    CoverageLineTableMismatch {
        /// Accumulation key of the unit
        unit: String,
        /// First disagreement found
        reason: String,
    },

    /// The external report generator failed
    #[error("Report generator `{program}` failed on {artifact} ({status}):\n{output}")]
    ToolInvocationFailure {
        /// Program that was run
        program: String,
        /// Coverage data artifact it was given
        artifact: PathBuf,
        /// Exit status, or the spawn error
        status: String,
        /// Captured stdout and stderr
        output: String,
    },

    /// Accumulation or scratch area could not be created, read or removed
    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Operation called in the wrong lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Configuration rejected during validation
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// YAML configuration could not be decoded
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Artifact glob pattern is invalid
    #[error("Invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl SessionError {
    /// Create a malformed report error
    #[must_use]
    pub fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedReport {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    /// Create a line table mismatch error
    #[must_use]
    pub fn mismatch(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CoverageLineTableMismatch {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Create a filesystem error for `path`
    #[must_use]
    pub fn filesystem(path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the session can no longer be finalized after this error
    ///
    /// Any failure while recording leaves the area short of a run, or
    /// holding part of one. Only misuse of the lifecycle leaves it intact.
    #[must_use]
    pub const fn aborts_session(&self) -> bool {
        !matches!(self, Self::InvalidState { .. })
    }
}

/// Attach a path to an I/O result
pub(crate) trait IoContext<T> {
    fn at(self, path: &Path) -> SessionResult<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> SessionResult<T> {
        self.map_err(|e| SessionError::filesystem(path, e))
    }
}
