//! Error type for pipeline runs.

use std::path::PathBuf;
use thiserror::Error;

use super::types::StageId;
use crate::request::RequestError;
use crate::runner::RunnerError;
use crate::topology::TopologyError;
use crate::workspace::WorkspaceError;

/// Reasons a map run did not complete.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request was rejected before any work started.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// The pipeline no longer accepts runs.
    #[error("Pipeline is shutting down")]
    Closed,

    /// The run workspace could not be cleaned or populated.
    #[error("Workspace setup failed: {0}")]
    Workspace(#[from] WorkspaceError),

    /// A stage input did not exist when the stage was about to start.
    #[error("Stage {stage} is missing input {path}")]
    MissingInput { stage: StageId, path: PathBuf },

    /// The stage's external tool failed.
    #[error("Stage {stage} failed: {source}")]
    Stage {
        stage: StageId,
        #[source]
        source: RunnerError,
    },

    /// The generated topology could not be post-processed.
    #[error("Stage {stage} failed to rewrite topology: {source}")]
    Topology {
        stage: StageId,
        #[source]
        source: TopologyError,
    },

    /// Copying final artifacts into the public directory failed.
    #[error("Stage {stage} failed to publish: {source}")]
    Publish {
        stage: StageId,
        #[source]
        source: WorkspaceError,
    },
}

impl PipelineError {
    /// The stage that failed, if the failure happened inside one.
    pub fn stage(&self) -> Option<StageId> {
        match self {
            Self::MissingInput { stage, .. }
            | Self::Stage { stage, .. }
            | Self::Topology { stage, .. }
            | Self::Publish { stage, .. } => Some(*stage),
            Self::InvalidRequest(_) | Self::Closed | Self::Workspace(_) => None,
        }
    }

    /// Whether the caller, not the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_identifies_stage() {
        let err = PipelineError::Stage {
            stage: StageId::ReprojectElevation,
            source: RunnerError::non_zero_exit("gdalwarp", Some(1), None),
        };
        assert_eq!(err.stage(), Some(StageId::ReprojectElevation));
        assert!(!err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Stage 7 (reproject_elevation) failed: gdalwarp exited with code 1"
        );
    }

    #[test]
    fn test_invalid_request_is_client_error() {
        let err = PipelineError::from(RequestError::EmptySelection);
        assert!(err.is_client_error());
        assert_eq!(err.stage(), None);
    }
}
