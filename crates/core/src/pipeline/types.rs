//! Types for the pipeline module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The fifteen stages of a map run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    CropBoundariesToSelection,
    CropRiversToWindow,
    CropBoundariesToWindow,
    AssignElevationSrs,
    CropElevationToCutline,
    CropElevationToWindow,
    ReprojectElevation,
    Hillshade,
    MakeTransparent,
    EncodeImage,
    RiversToGeojson,
    BoundariesToGeojson,
    RiversToTopojson,
    BoundariesToTopojson,
    Publish,
}

impl StageId {
    pub const ALL: [StageId; 15] = [
        StageId::CropBoundariesToSelection,
        StageId::CropRiversToWindow,
        StageId::CropBoundariesToWindow,
        StageId::AssignElevationSrs,
        StageId::CropElevationToCutline,
        StageId::CropElevationToWindow,
        StageId::ReprojectElevation,
        StageId::Hillshade,
        StageId::MakeTransparent,
        StageId::EncodeImage,
        StageId::RiversToGeojson,
        StageId::BoundariesToGeojson,
        StageId::RiversToTopojson,
        StageId::BoundariesToTopojson,
        StageId::Publish,
    ];

    /// 1-based position in the run.
    pub fn number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StageId::CropBoundariesToSelection => "crop_boundaries_to_selection",
            StageId::CropRiversToWindow => "crop_rivers_to_window",
            StageId::CropBoundariesToWindow => "crop_boundaries_to_window",
            StageId::AssignElevationSrs => "assign_elevation_srs",
            StageId::CropElevationToCutline => "crop_elevation_to_cutline",
            StageId::CropElevationToWindow => "crop_elevation_to_window",
            StageId::ReprojectElevation => "reproject_elevation",
            StageId::Hillshade => "hillshade",
            StageId::MakeTransparent => "make_transparent",
            StageId::EncodeImage => "encode_image",
            StageId::RiversToGeojson => "rivers_to_geojson",
            StageId::BoundariesToGeojson => "boundaries_to_geojson",
            StageId::RiversToTopojson => "rivers_to_topojson",
            StageId::BoundariesToTopojson => "boundaries_to_topojson",
            StageId::Publish => "publish",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

/// Timing of one completed stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: StageId,
    pub duration_ms: u64,
}

/// Copies of the final artifacts in the public directory.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedArtifacts {
    pub image: PathBuf,
    pub topo: PathBuf,
    pub rivers: PathBuf,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct MapArtifacts {
    pub run_id: String,
    /// `north_west_east_south` of the requested window.
    pub window: String,
    pub workspace: PathBuf,
    /// Final image inside the workspace.
    pub image: PathBuf,
    /// Boundary topology inside the workspace.
    pub topo: PathBuf,
    /// River topology inside the workspace.
    pub rivers: PathBuf,
    pub published: PublishedArtifacts,
    pub stages: Vec<StageReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Snapshot of the pipeline's activity.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub active_runs: Vec<String>,
    pub max_concurrent_runs: usize,
    pub total_succeeded: u64,
    pub total_failed: u64,
}
