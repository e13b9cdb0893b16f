//! Error types for the workspace module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing, cleaning or publishing a workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Pristine source directory is missing.
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Removing an existing file or directory failed.
    #[error("Failed to clean {path}: {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating a directory failed.
    #[error("Failed to create directory {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying an entry failed.
    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkspaceError {
    pub fn copy_failed(from: PathBuf, to: PathBuf, source: std::io::Error) -> Self {
        Self::CopyFailed { from, to, source }
    }
}
