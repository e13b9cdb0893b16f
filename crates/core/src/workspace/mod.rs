//! Scratch workspaces and artifact publication.
//!
//! Every map run gets its own directory under the workspace root, recreated
//! from the pristine source datasets. Final artifacts are copied out into the
//! public directory once every stage succeeded.

mod error;
mod fs;
mod manager;
mod publish;

pub use error::WorkspaceError;
pub use fs::{copy_dir_recursive, remove_if_exists, reset};
pub use manager::{Workspace, WorkspaceManager};
pub use publish::{publish_files, PublishedFile};
