//! Map generation pipeline.
//!
//! A run is an ordered list of fifteen stages. Each stage consumes artifacts
//! produced by earlier stages (or copied from the source datasets) and
//! produces new ones inside the run's workspace:
//!
//! ```text
//! admin.shp ─▶ 1 selection ─▶ 3 window ─┬─────────────▶ 12 geojson ─▶ 14 topojson ─┐
//! rivers.shp ─▶ 2 window ───────────────┼─▶ 11 geojson ─▶ 13 topojson ─────────────┤
//! elevation.tif ─▶ 4 srs ─▶ 5 cutline ◀─┘                                          │
//!                  ─▶ 6 window ─▶ 7 reproject ─▶ 8 hillshade                        │
//!                  ─▶ 9 transparent ─▶ 10 webp ───────────────────────────────────▶ 15 publish
//! ```
//!
//! The first failing stage aborts the run. Runs never share a workspace.

mod artifacts;
mod driver;
mod error;
mod plan;
mod types;

pub use artifacts::ArtifactPaths;
pub use driver::MapPipeline;
pub use error::PipelineError;
pub use plan::{build_plan, hillshade_args, PostProcess, Stage, StageAction};
pub use types::{MapArtifacts, PipelineStatus, PublishedArtifacts, StageId, StageReport};
