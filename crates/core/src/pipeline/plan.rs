//! Stage descriptors and the fixed run plan.

use std::path::{Path, PathBuf};

use super::artifacts::ArtifactPaths;
use super::types::StageId;
use crate::config::{HillshadeMode, RenderConfig};
use crate::request::BoundingWindow;
use crate::runner::{OutputSink, Tool, ToolInvocation};

/// Work performed after a stage's tool succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum PostProcess {
    /// Reduce feature properties of the topology at this path.
    RewriteTopology(PathBuf),
}

/// What a stage does.
#[derive(Debug, Clone, PartialEq)]
pub enum StageAction {
    /// Launch an external tool.
    Run {
        invocation: ToolInvocation,
        post: Option<PostProcess>,
    },
    /// Copy files into the public directory.
    Publish {
        files: Vec<PathBuf>,
        public_dir: PathBuf,
    },
}

/// One step of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub id: StageId,
    pub action: StageAction,
    /// Files that must exist before the stage starts.
    pub inputs: Vec<PathBuf>,
    /// Files the stage creates.
    pub outputs: Vec<PathBuf>,
}

impl Stage {
    fn run(id: StageId, tool: Tool, args: Vec<String>, inputs: &[&Path], output: &Path) -> Self {
        let outputs = vec![output.to_path_buf()];
        Self {
            id,
            action: StageAction::Run {
                invocation: ToolInvocation::new(tool, args).with_outputs(outputs.clone()),
                post: None,
            },
            inputs: inputs.iter().map(|p| p.to_path_buf()).collect(),
            outputs,
        }
    }

    /// Tool output goes to `output` instead of the log.
    fn redirect_to(mut self, output: &Path) -> Self {
        if let StageAction::Run { invocation, .. } = &mut self.action {
            invocation.sink = OutputSink::File(output.to_path_buf());
        }
        self
    }

    fn then(mut self, next: PostProcess) -> Self {
        if let StageAction::Run { post, .. } = &mut self.action {
            *post = Some(next);
        }
        self
    }

    /// The tool invocation, unless this is the publish stage.
    pub fn invocation(&self) -> Option<&ToolInvocation> {
        match &self.action {
            StageAction::Run { invocation, .. } => Some(invocation),
            StageAction::Publish { .. } => None,
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// `gdaldem hillshade` options for the configured shading mode.
pub fn hillshade_args(mode: &HillshadeMode) -> Vec<String> {
    match mode {
        HillshadeMode::Illumination {
            z_factor,
            scale,
            azimuth,
            altitude,
        } => vec![
            "-z".to_string(),
            z_factor.to_string(),
            "-s".to_string(),
            scale.to_string(),
            "-az".to_string(),
            azimuth.to_string(),
            "-alt".to_string(),
            altitude.to_string(),
        ],
        HillshadeMode::ComputeEdges => vec!["-compute_edges".to_string()],
    }
}

/// Builds the fifteen stages of a run.
pub fn build_plan(
    paths: &ArtifactPaths,
    window: &BoundingWindow,
    country_filter: &str,
    render: &RenderConfig,
    public_dir: &Path,
) -> Vec<Stage> {
    let corners = window.corner_args();
    let nodata = render.nodata.to_string();
    let p = paths;

    let crop_selection = {
        let mut a = args(["-where", country_filter, "-lco", "ENCODING=UTF-8"]);
        a.extend([path_arg(&p.countries_selection_shp), path_arg(&p.admin_source)]);
        Stage::run(
            StageId::CropBoundariesToSelection,
            Tool::Ogr2ogr,
            a,
            &[&p.admin_source],
            &p.countries_selection_shp,
        )
    };

    let crop_rivers = {
        let mut a = vec!["-clipsrc".to_string()];
        a.extend(corners.iter().cloned());
        a.extend([path_arg(&p.rivers_window_shp), path_arg(&p.rivers_source)]);
        Stage::run(
            StageId::CropRiversToWindow,
            Tool::Ogr2ogr,
            a,
            &[&p.rivers_source],
            &p.rivers_window_shp,
        )
    };

    let crop_boundaries = {
        let mut a = vec!["-clipsrc".to_string()];
        a.extend(corners.iter().cloned());
        a.extend([
            path_arg(&p.countries_window_shp),
            path_arg(&p.countries_selection_shp),
        ]);
        Stage::run(
            StageId::CropBoundariesToWindow,
            Tool::Ogr2ogr,
            a,
            &[&p.countries_selection_shp],
            &p.countries_window_shp,
        )
    };

    let assign_srs = Stage::run(
        StageId::AssignElevationSrs,
        Tool::GdalTranslate,
        vec![
            "-a_srs".to_string(),
            render.source_srs.clone(),
            path_arg(&p.elevation_source),
            path_arg(&p.elevation_srs_tif),
            "-a_nodata".to_string(),
            nodata.clone(),
        ],
        &[&p.elevation_source],
        &p.elevation_srs_tif,
    );

    let crop_cutline = Stage::run(
        StageId::CropElevationToCutline,
        Tool::Gdalwarp,
        vec![
            "-cutline".to_string(),
            path_arg(&p.countries_window_shp),
            "-crop_to_cutline".to_string(),
            "-dstalpha".to_string(),
            "-dstnodata".to_string(),
            nodata.clone(),
            path_arg(&p.elevation_srs_tif),
            path_arg(&p.elevation_cutline_tif),
        ],
        &[&p.countries_window_shp, &p.elevation_srs_tif],
        &p.elevation_cutline_tif,
    );

    let crop_window = {
        let mut a = vec!["-projwin".to_string()];
        a.extend(corners.iter().cloned());
        a.extend([
            path_arg(&p.elevation_cutline_tif),
            path_arg(&p.elevation_window_tif),
            "-a_nodata".to_string(),
            nodata,
        ]);
        Stage::run(
            StageId::CropElevationToWindow,
            Tool::GdalTranslate,
            a,
            &[&p.elevation_cutline_tif],
            &p.elevation_window_tif,
        )
    };

    let reproject = Stage::run(
        StageId::ReprojectElevation,
        Tool::Gdalwarp,
        vec![
            "-t_srs".to_string(),
            render.target_srs.clone(),
            path_arg(&p.elevation_window_tif),
            path_arg(&p.elevation_projected_tif),
        ],
        &[&p.elevation_window_tif],
        &p.elevation_projected_tif,
    );

    let hillshade = {
        let mut a = vec![
            "hillshade".to_string(),
            path_arg(&p.elevation_projected_tif),
            path_arg(&p.shaded_tif),
        ];
        a.extend(hillshade_args(&render.hillshade));
        Stage::run(
            StageId::Hillshade,
            Tool::Gdaldem,
            a,
            &[&p.elevation_projected_tif],
            &p.shaded_tif,
        )
    };

    let transparent = Stage::run(
        StageId::MakeTransparent,
        Tool::Convert,
        vec![
            path_arg(&p.shaded_tif),
            "-resize".to_string(),
            render.image_width.to_string(),
            "-trim".to_string(),
            "+repage".to_string(),
            "-fuzz".to_string(),
            format!("{}%", render.fuzz_percent),
            "-transparent".to_string(),
            render.transparent_color.clone(),
            path_arg(&p.transparent_png),
        ],
        &[&p.shaded_tif],
        &p.transparent_png,
    );

    let encode = Stage::run(
        StageId::EncodeImage,
        Tool::Convert,
        vec![
            path_arg(&p.transparent_png),
            "-strip".to_string(),
            "-define".to_string(),
            format!("webp:target-size={}", render.webp_target_size),
            path_arg(&p.final_image),
        ],
        &[&p.transparent_png],
        &p.final_image,
    );

    let rivers_geojson = Stage::run(
        StageId::RiversToGeojson,
        Tool::Ogr2ogr,
        vec![
            "-f".to_string(),
            "GeoJSON".to_string(),
            path_arg(&p.rivers_geojson),
            path_arg(&p.rivers_window_shp),
        ],
        &[&p.rivers_window_shp],
        &p.rivers_geojson,
    );

    let boundaries_geojson = Stage::run(
        StageId::BoundariesToGeojson,
        Tool::Ogr2ogr,
        vec![
            "-f".to_string(),
            "GeoJSON".to_string(),
            path_arg(&p.countries_geojson),
            path_arg(&p.countries_window_shp),
        ],
        &[&p.countries_window_shp],
        &p.countries_geojson,
    );

    let rivers_topojson = Stage::run(
        StageId::RiversToTopojson,
        Tool::Geo2topo,
        vec![path_arg(&p.rivers_geojson)],
        &[&p.rivers_geojson],
        &p.rivers_topojson,
    )
    .redirect_to(&p.rivers_topojson);

    let boundaries_topojson = Stage::run(
        StageId::BoundariesToTopojson,
        Tool::Geo2topo,
        vec![path_arg(&p.countries_geojson)],
        &[&p.countries_geojson],
        &p.countries_topojson,
    )
    .redirect_to(&p.countries_topojson)
    .then(PostProcess::RewriteTopology(p.countries_topojson.clone()));

    let published = p.published();
    let publish = Stage {
        id: StageId::Publish,
        action: StageAction::Publish {
            files: published.clone(),
            public_dir: public_dir.to_path_buf(),
        },
        outputs: published
            .iter()
            .filter_map(|f| f.file_name().map(|name| public_dir.join(name)))
            .collect(),
        inputs: published,
    };

    vec![
        crop_selection,
        crop_rivers,
        crop_boundaries,
        assign_srs,
        crop_cutline,
        crop_window,
        reproject,
        hillshade,
        transparent,
        encode,
        rivers_geojson,
        boundaries_geojson,
        rivers_topojson,
        boundaries_topojson,
        publish,
    ]
}
