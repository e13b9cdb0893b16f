use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};

use super::error::WorkspaceError;
use super::fs::{remove_if_exists, reset};

/// Scratch directory of a single run.
#[derive(Debug, Clone)]
pub struct Workspace {
    run_id: String,
    dir: PathBuf,
}

impl Workspace {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `relative` inside the workspace.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.join(relative)
    }
}

/// Creates and prunes per-run workspaces under a common root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    source_dir: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: PathBuf, source_dir: PathBuf) -> Self {
        Self { root, source_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resets `<root>/<run_id>` from the source directory.
    pub async fn prepare(&self, run_id: &str) -> Result<Workspace, WorkspaceError> {
        let dir = self.root.join(run_id);
        reset(&dir, &self.source_dir).await?;
        info!(run_id, path = %dir.display(), "Workspace prepared");
        Ok(Workspace {
            run_id: run_id.to_string(),
            dir,
        })
    }

    /// Keeps the `keep` most recently modified run directories, never touching
    /// those listed in `active`. `keep == 0` disables pruning.
    ///
    /// Returns the number of directories removed.
    pub async fn prune(
        &self,
        keep: usize,
        active: &HashSet<String>,
    ) -> Result<usize, WorkspaceError> {
        if keep == 0 {
            return Ok(0);
        }

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(WorkspaceError::Io(e)),
        };

        let mut runs: Vec<(SystemTime, PathBuf)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if active.contains(&name) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_dir() => metadata,
                _ => continue,
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            runs.push((modified, entry.path()));
        }

        if runs.len() <= keep {
            return Ok(0);
        }

        runs.sort_by(|a, b| b.0.cmp(&a.0));
        let mut removed = 0;
        for (_, path) in runs.into_iter().skip(keep) {
            match remove_if_exists(&path).await {
                Ok(true) => {
                    debug!(path = %path.display(), "Pruned old workspace");
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to prune workspace"),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(temp: &TempDir) -> WorkspaceManager {
        WorkspaceManager::new(temp.path().join("data"), temp.path().join("original"))
    }

    #[tokio::test]
    async fn test_prepare_creates_isolated_dirs() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("original")).await.unwrap();
        fs::write(temp.path().join("original/elevation.tif"), b"tif")
            .await
            .unwrap();

        let manager = manager(&temp);
        let a = manager.prepare("run-a").await.unwrap();
        let b = manager.prepare("run-b").await.unwrap();

        assert_ne!(a.dir(), b.dir());
        assert_eq!(a.run_id(), "run-a");
        assert!(a.path("elevation.tif").exists());
        assert!(b.path("elevation.tif").exists());
    }

    #[tokio::test]
    async fn test_prune_without_root_is_noop() {
        let temp = TempDir::new().unwrap();
        let removed = manager(&temp).prune(2, &HashSet::new()).await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_prune_keeps_newest_and_active() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        for name in ["r1", "r2", "r3", "r4"] {
            fs::create_dir_all(manager.root().join(name)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        let active: HashSet<String> = ["r1".to_string()].into_iter().collect();
        let removed = manager.prune(2, &active).await.unwrap();

        assert_eq!(removed, 1);
        assert!(manager.root().join("r1").exists());
        assert!(!manager.root().join("r2").exists());
        assert!(manager.root().join("r3").exists());
        assert!(manager.root().join("r4").exists());
    }

    #[tokio::test]
    async fn test_prune_disabled() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        fs::create_dir_all(manager.root().join("r1")).await.unwrap();
        assert_eq!(manager.prune(0, &HashSet::new()).await.unwrap(), 0);
        assert!(manager.root().join("r1").exists());
    }
}
