use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Directory layout used by the map pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Pristine copy of the source datasets, copied into every run workspace.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Parent directory of the per-run workspaces.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Directory the final artifacts are published into.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// JSON array of `{name, code, continent}` entries.
    #[serde(default = "default_catalog_file")]
    pub catalog_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            workspace_root: default_workspace_root(),
            public_dir: default_public_dir(),
            catalog_file: default_catalog_file(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("original")
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_catalog_file() -> PathBuf {
    PathBuf::from("countries.json")
}

/// Source datasets, relative to a run workspace.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    #[serde(default = "default_admin_boundaries")]
    pub admin_boundaries: PathBuf,
    #[serde(default = "default_rivers")]
    pub rivers: PathBuf,
    #[serde(default = "default_elevation")]
    pub elevation: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            admin_boundaries: default_admin_boundaries(),
            rivers: default_rivers(),
            elevation: default_elevation(),
        }
    }
}

fn default_admin_boundaries() -> PathBuf {
    PathBuf::from("ne_10m_admin_0_countries/ne_10m_admin_0_countries.shp")
}

fn default_rivers() -> PathBuf {
    PathBuf::from("ne_10m_rivers_lake_centerlines/ne_10m_rivers_lake_centerlines.shp")
}

fn default_elevation() -> PathBuf {
    PathBuf::from("ETOPO1_Ice_g_geotiff.tif")
}

/// Paths of the external binaries. Bare names are resolved on `PATH`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ogr2ogr")]
    pub ogr2ogr: PathBuf,
    #[serde(default = "default_gdal_translate")]
    pub gdal_translate: PathBuf,
    #[serde(default = "default_gdalwarp")]
    pub gdalwarp: PathBuf,
    #[serde(default = "default_gdaldem")]
    pub gdaldem: PathBuf,
    #[serde(default = "default_convert")]
    pub convert: PathBuf,
    #[serde(default = "default_geo2topo")]
    pub geo2topo: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ogr2ogr: default_ogr2ogr(),
            gdal_translate: default_gdal_translate(),
            gdalwarp: default_gdalwarp(),
            gdaldem: default_gdaldem(),
            convert: default_convert(),
            geo2topo: default_geo2topo(),
        }
    }
}

fn default_ogr2ogr() -> PathBuf {
    PathBuf::from("ogr2ogr")
}

fn default_gdal_translate() -> PathBuf {
    PathBuf::from("gdal_translate")
}

fn default_gdalwarp() -> PathBuf {
    PathBuf::from("gdalwarp")
}

fn default_gdaldem() -> PathBuf {
    PathBuf::from("gdaldem")
}

fn default_convert() -> PathBuf {
    PathBuf::from("convert")
}

fn default_geo2topo() -> PathBuf {
    PathBuf::from("geo2topo")
}

/// Raster and image parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Spatial reference assigned to the raw elevation raster.
    #[serde(default = "default_source_srs")]
    pub source_srs: String,
    /// Spatial reference the elevation raster is warped into before shading.
    #[serde(default = "default_target_srs")]
    pub target_srs: String,
    /// Nodata value applied to elevation rasters.
    #[serde(default)]
    pub nodata: i32,
    /// Width in pixels of the shaded image after resize.
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    /// Fuzz tolerance (percent) for the transparent color key.
    #[serde(default = "default_fuzz_percent")]
    pub fuzz_percent: f64,
    /// Color made transparent in the shaded image.
    #[serde(default = "default_transparent_color")]
    pub transparent_color: String,
    /// Target size of the encoded webp image, e.g. `"300kb"`.
    #[serde(default = "default_webp_target_size")]
    pub webp_target_size: String,
    #[serde(default)]
    pub hillshade: HillshadeMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            source_srs: default_source_srs(),
            target_srs: default_target_srs(),
            nodata: 0,
            image_width: default_image_width(),
            fuzz_percent: default_fuzz_percent(),
            transparent_color: default_transparent_color(),
            webp_target_size: default_webp_target_size(),
            hillshade: HillshadeMode::default(),
        }
    }
}

fn default_source_srs() -> String {
    "EPSG:4326".to_string()
}

fn default_target_srs() -> String {
    "EPSG:3857".to_string()
}

fn default_image_width() -> u32 {
    2400
}

fn default_fuzz_percent() -> f64 {
    7.0
}

fn default_transparent_color() -> String {
    "#DDDDDD".to_string()
}

fn default_webp_target_size() -> String {
    "300kb".to_string()
}

/// How `gdaldem hillshade` shades the relief.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HillshadeMode {
    /// Explicit light source.
    Illumination {
        #[serde(default = "default_z_factor")]
        z_factor: f64,
        #[serde(default = "default_scale")]
        scale: f64,
        #[serde(default = "default_azimuth")]
        azimuth: f64,
        #[serde(default = "default_altitude")]
        altitude: f64,
    },
    /// `-compute_edges` with the tool's default light source.
    ComputeEdges,
}

impl Default for HillshadeMode {
    fn default() -> Self {
        Self::Illumination {
            z_factor: default_z_factor(),
            scale: default_scale(),
            azimuth: default_azimuth(),
            altitude: default_altitude(),
        }
    }
}

fn default_z_factor() -> f64 {
    5.0
}

fn default_scale() -> f64 {
    111120.0
}

fn default_azimuth() -> f64 {
    315.0
}

fn default_altitude() -> f64 {
    60.0
}

/// Run scheduling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Maximum number of map runs executing at the same time.
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,
    /// Per-stage timeout; unset means a stage may run indefinitely.
    #[serde(default)]
    pub stage_timeout_secs: Option<u64>,
    /// Number of most recent run workspaces kept on disk (0 keeps all).
    #[serde(default = "default_keep_runs")]
    pub keep_runs: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: default_max_concurrent_runs(),
            stage_timeout_secs: None,
            keep_runs: default_keep_runs(),
        }
    }
}

fn default_max_concurrent_runs() -> usize {
    2
}

fn default_keep_runs() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.paths.workspace_root.to_str().unwrap(), "data");
        assert_eq!(config.render.source_srs, "EPSG:4326");
        assert_eq!(config.render.nodata, 0);
        assert!(config.pipeline.stage_timeout_secs.is_none());
    }

    #[test]
    fn test_deserialize_partial_illumination_fills_defaults() {
        let toml = r#"
[render.hillshade]
mode = "illumination"
azimuth = 270.0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.render.hillshade,
            HillshadeMode::Illumination {
                z_factor: 5.0,
                scale: 111120.0,
                azimuth: 270.0,
                altitude: 60.0,
            }
        );
    }

    #[test]
    fn test_deserialize_custom_dataset() {
        let toml = r#"
[dataset]
elevation = "srtm/merged.tif"

[pipeline]
stage_timeout_secs = 600
keep_runs = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.dataset.elevation.to_str().unwrap(), "srtm/merged.tif");
        assert_eq!(
            config.dataset.admin_boundaries.to_str().unwrap(),
            "ne_10m_admin_0_countries/ne_10m_admin_0_countries.shp"
        );
        assert_eq!(config.pipeline.stage_timeout_secs, Some(600));
        assert_eq!(config.pipeline.keep_runs, 0);
    }

    #[test]
    fn test_config_serializes_hillshade_tag() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["render"]["hillshade"]["mode"], "illumination");
        assert_eq!(json["tools"]["geo2topo"], "geo2topo");
    }
}
