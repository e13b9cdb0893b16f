//! Filesystem primitives for workspace handling.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::error::WorkspaceError;

/// Removes a file or directory tree. A missing target counts as success.
///
/// Returns whether something was removed.
pub async fn remove_if_exists(path: &Path) -> Result<bool, WorkspaceError> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(source) => {
            return Err(WorkspaceError::CleanupFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(true),
        // Raced with another cleanup.
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(WorkspaceError::CleanupFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Deletes `workspace_dir`, recreates it and copies `source_dir` into it.
pub async fn reset(workspace_dir: &Path, source_dir: &Path) -> Result<(), WorkspaceError> {
    if !fs::try_exists(source_dir).await.unwrap_or(false) {
        return Err(WorkspaceError::SourceNotFound {
            path: source_dir.to_path_buf(),
        });
    }

    if remove_if_exists(workspace_dir).await? {
        debug!(path = %workspace_dir.display(), "Removed previous workspace");
    }

    fs::create_dir_all(workspace_dir)
        .await
        .map_err(|source| WorkspaceError::CreateFailed {
            path: workspace_dir.to_path_buf(),
            source,
        })?;

    let copied = copy_dir_recursive(source_dir, workspace_dir).await?;
    debug!(
        path = %workspace_dir.display(),
        files = copied,
        "Workspace populated from source"
    );
    Ok(())
}

/// Copies the contents of `from` into the existing directory `to`.
///
/// Symlinks are followed. Returns the number of files copied.
pub async fn copy_dir_recursive(from: &Path, to: &Path) -> Result<usize, WorkspaceError> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(from.to_path_buf(), to.to_path_buf())];
    let mut copied = 0;

    while let Some((src_dir, dst_dir)) = pending.pop() {
        let mut entries = fs::read_dir(&src_dir)
            .await
            .map_err(|e| WorkspaceError::copy_failed(src_dir.clone(), dst_dir.clone(), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WorkspaceError::copy_failed(src_dir.clone(), dst_dir.clone(), e))?
        {
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());
            let metadata = fs::metadata(&src)
                .await
                .map_err(|e| WorkspaceError::copy_failed(src.clone(), dst.clone(), e))?;

            if metadata.is_dir() {
                fs::create_dir_all(&dst)
                    .await
                    .map_err(|source| WorkspaceError::CreateFailed {
                        path: dst.clone(),
                        source,
                    })?;
                pending.push((src, dst));
            } else {
                fs::copy(&src, &dst)
                    .await
                    .map_err(|e| WorkspaceError::copy_failed(src.clone(), dst.clone(), e))?;
                copied += 1;
            }
        }
    }

    Ok(copied)
}
