use std::path::{Path, PathBuf};

use crate::config::DatasetConfig;
use crate::workspace::Workspace;

/// Every file a run reads or writes, derived from its workspace and window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub admin_source: PathBuf,
    pub rivers_source: PathBuf,
    pub elevation_source: PathBuf,

    pub countries_selection_shp: PathBuf,
    pub rivers_window_shp: PathBuf,
    pub countries_window_shp: PathBuf,

    pub elevation_srs_tif: PathBuf,
    pub elevation_cutline_tif: PathBuf,
    pub elevation_window_tif: PathBuf,
    pub elevation_projected_tif: PathBuf,
    pub shaded_tif: PathBuf,
    pub transparent_png: PathBuf,
    pub final_image: PathBuf,

    pub rivers_geojson: PathBuf,
    pub countries_geojson: PathBuf,
    pub rivers_topojson: PathBuf,
    pub countries_topojson: PathBuf,
}

impl ArtifactPaths {
    pub fn new(workspace: &Workspace, dataset: &DatasetConfig, slug: &str) -> Self {
        Self::in_dir(workspace.dir(), dataset, slug)
    }

    pub fn in_dir(dir: &Path, dataset: &DatasetConfig, slug: &str) -> Self {
        let (image, rivers_topo, countries_topo) = Self::published_names(slug);
        Self {
            admin_source: dir.join(&dataset.admin_boundaries),
            rivers_source: dir.join(&dataset.rivers),
            elevation_source: dir.join(&dataset.elevation),

            countries_selection_shp: dir.join("countries_selection.shp"),
            rivers_window_shp: dir.join("rivers_window.shp"),
            countries_window_shp: dir.join("countries_window.shp"),

            elevation_srs_tif: dir.join("elevation_srs.tif"),
            elevation_cutline_tif: dir.join("elevation_cutline.tif"),
            elevation_window_tif: dir.join("elevation_window.tif"),
            elevation_projected_tif: dir.join("elevation_projected.tif"),
            shaded_tif: dir.join("shadedrelief.tif"),
            transparent_png: dir.join("transparent.png"),
            final_image: dir.join(image),

            rivers_geojson: dir.join("rivers.geo.json"),
            countries_geojson: dir.join("countries.geo.json"),
            rivers_topojson: dir.join(rivers_topo),
            countries_topojson: dir.join(countries_topo),
        }
    }

    /// File names of the published artifacts: image, river topology, boundary topology.
    pub fn published_names(slug: &str) -> (String, String, String) {
        (
            format!("{}.webp", slug),
            format!("{}_rivers.topo.json", slug),
            format!("{}_countries.topo.json", slug),
        )
    }

    /// Artifacts copied into the public directory.
    pub fn published(&self) -> Vec<PathBuf> {
        vec![
            self.final_image.clone(),
            self.countries_topojson.clone(),
            self.rivers_topojson.clone(),
        ]
    }
}
