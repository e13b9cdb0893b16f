//! Copies final artifacts into the public directory.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::error::WorkspaceError;
use super::fs::remove_if_exists;

/// An artifact copied into the public directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// A copy sitting under its temporary name, waiting to be renamed into place.
struct StagedFile {
    source: PathBuf,
    staging: PathBuf,
    destination: PathBuf,
}

/// Copies every file of `sources` into `public_dir`, keeping its file name.
///
/// All copies land under temporary names first. Only when every copy
/// succeeded are they renamed over the previous artifacts, so readers of the
/// public directory never see a half-written file and a failed publish leaves
/// the earlier artifacts in place. Temporary files never outlive the call.
pub async fn publish_files(
    sources: &[PathBuf],
    public_dir: &Path,
) -> Result<Vec<PublishedFile>, WorkspaceError> {
    fs::create_dir_all(public_dir)
        .await
        .map_err(|source| WorkspaceError::CreateFailed {
            path: public_dir.to_path_buf(),
            source,
        })?;

    let results = join_all(sources.iter().map(|source| stage_one(source, public_dir))).await;

    let mut staged = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(file) => staged.push(file),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        discard(&staged).await;
        return Err(e);
    }

    let mut published = Vec::with_capacity(staged.len());
    for (index, file) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(&file.staging, &file.destination).await {
            discard(&staged[index..]).await;
            return Err(WorkspaceError::copy_failed(
                file.source.clone(),
                file.destination.clone(),
                e,
            ));
        }
        debug!(
            from = %file.source.display(),
            to = %file.destination.display(),
            "Published artifact"
        );
        published.push(PublishedFile {
            source: file.source.clone(),
            destination: file.destination.clone(),
        });
    }
    Ok(published)
}

async fn stage_one(source: &Path, public_dir: &Path) -> Result<StagedFile, WorkspaceError> {
    let file_name = source.file_name().ok_or_else(|| {
        WorkspaceError::copy_failed(
            source.to_path_buf(),
            public_dir.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name"),
        )
    })?;
    let destination = public_dir.join(file_name);
    let staging = public_dir.join(format!(
        ".{}.{}.part",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    ));

    if let Err(e) = fs::copy(source, &staging).await {
        if let Err(cleanup) = remove_if_exists(&staging).await {
            warn!(path = %staging.display(), error = %cleanup, "Failed to remove staging file");
        }
        return Err(WorkspaceError::copy_failed(source.to_path_buf(), staging, e));
    }

    Ok(StagedFile {
        source: source.to_path_buf(),
        staging,
        destination,
    })
}

/// Removes staging files; absent ones are fine.
async fn discard(staged: &[StagedFile]) {
    for file in staged {
        if let Err(e) = remove_if_exists(&file.staging).await {
            warn!(path = %file.staging.display(), error = %e, "Failed to remove staging file");
        }
    }
}
