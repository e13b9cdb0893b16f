//! Error types for the runner module.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Tool binary not found.
    #[error("{tool} not found at path: {path}")]
    ToolNotFound { tool: String, path: PathBuf },

    /// One or more tool binaries could not be launched.
    #[error("Missing tools: {}", format_missing(missing))]
    ToolsMissing { missing: Vec<(String, PathBuf)> },

    /// Process could not be started.
    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a non-zero status, or was killed by a signal.
    #[error("{command} exited with code {}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none (signal)".to_string()))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    /// Process exceeded the stage timeout and was killed.
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The file receiving the process output could not be opened.
    #[error("Failed to open output file {path}: {source}")]
    SinkFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_missing(missing: &[(String, PathBuf)]) -> String {
    missing
        .iter()
        .map(|(tool, path)| format!("{} ({})", tool, path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl RunnerError {
    /// Creates a non-zero exit error with captured stderr.
    pub fn non_zero_exit(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: Option<String>,
    ) -> Self {
        Self::NonZeroExit {
            command: command.into(),
            exit_code,
            stderr,
        }
    }

    /// Exit code of the failed process, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Captured diagnostic output of the failed process.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
