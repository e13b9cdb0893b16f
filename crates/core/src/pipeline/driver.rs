//! Run driver: admission, workspace lifecycle and sequential stage execution.

use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::artifacts::ArtifactPaths;
use super::error::PipelineError;
use super::plan::{build_plan, PostProcess, Stage, StageAction};
use super::types::{MapArtifacts, PipelineStatus, PublishedArtifacts, StageId, StageReport};
use crate::config::{Config, DatasetConfig, RenderConfig};
use crate::countries::CountryCatalog;
use crate::metrics;
use crate::request::{BoundingWindow, MapRequest};
use crate::runner::ToolRunner;
use crate::topology::rewrite_topology_file;
use crate::workspace::{publish_files, WorkspaceManager};

/// Run counters.
#[derive(Default)]
struct RunStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Generates relief maps by driving the external tools stage by stage.
///
/// Each call to [`MapPipeline::generate`] gets its own workspace, so
/// concurrent runs never observe each other's intermediate files. The number
/// of simultaneous runs is bounded by `pipeline.max_concurrent_runs`.
pub struct MapPipeline {
    runner: Arc<dyn ToolRunner>,
    workspaces: WorkspaceManager,
    catalog: Arc<CountryCatalog>,
    dataset: DatasetConfig,
    render: RenderConfig,
    public_dir: PathBuf,
    keep_runs: usize,
    max_concurrent_runs: usize,
    semaphore: Arc<Semaphore>,
    active_runs: Arc<RwLock<HashSet<String>>>,
    latest: Arc<RwLock<Option<MapArtifacts>>>,
    stats: Arc<RunStats>,
}

impl MapPipeline {
    pub fn new(config: &Config, runner: Arc<dyn ToolRunner>, catalog: Arc<CountryCatalog>) -> Self {
        let max_concurrent_runs = config.pipeline.max_concurrent_runs.max(1);
        Self {
            runner,
            workspaces: WorkspaceManager::new(
                config.paths.workspace_root.clone(),
                config.paths.source_dir.clone(),
            ),
            catalog,
            dataset: config.dataset.clone(),
            render: config.render.clone(),
            public_dir: config.paths.public_dir.clone(),
            keep_runs: config.pipeline.keep_runs,
            max_concurrent_runs,
            semaphore: Arc::new(Semaphore::new(max_concurrent_runs)),
            active_runs: Arc::new(RwLock::new(HashSet::new())),
            latest: Arc::new(RwLock::new(None)),
            stats: Arc::new(RunStats::default()),
        }
    }

    pub fn catalog(&self) -> &CountryCatalog {
        &self.catalog
    }

    /// Result of the most recent successful run.
    pub async fn latest(&self) -> Option<MapArtifacts> {
        self.latest.read().await.clone()
    }

    pub async fn status(&self) -> PipelineStatus {
        let mut active_runs: Vec<String> = self.active_runs.read().await.iter().cloned().collect();
        active_runs.sort();
        PipelineStatus {
            active_runs,
            max_concurrent_runs: self.max_concurrent_runs,
            total_succeeded: self.stats.succeeded.load(Ordering::Relaxed),
            total_failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    /// Validates `request`, then runs all fifteen stages in a fresh workspace.
    ///
    /// Waits for a free slot when `max_concurrent_runs` runs are in progress.
    pub async fn generate(&self, request: &MapRequest) -> Result<MapArtifacts, PipelineError> {
        let filter = match request.resolve_filter(&self.catalog) {
            Ok(filter) => filter,
            Err(e) => {
                metrics::MAP_RUNS.with_label_values(&["rejected"]).inc();
                return Err(e.into());
            }
        };

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| PipelineError::Closed)?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let window = request.window.slug();
        self.active_runs.write().await.insert(run_id.clone());
        metrics::ACTIVE_RUNS.inc();

        let start = Instant::now();
        let span = info_span!("map_run", run_id = %run_id, window = %window);
        let result = self
            .run(&run_id, &request.window, &filter)
            .instrument(span)
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        self.active_runs.write().await.remove(&run_id);
        metrics::ACTIVE_RUNS.dec();

        match &result {
            Ok(artifacts) => {
                self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
                metrics::MAP_RUNS.with_label_values(&["success"]).inc();
                metrics::MAP_RUN_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed);
                *self.latest.write().await = Some(artifacts.clone());
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                metrics::MAP_RUNS.with_label_values(&["failed"]).inc();
                metrics::MAP_RUN_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed);
                error!(run_id = %run_id, window = %window, error = %e, "Map run failed");
            }
        }

        result
    }

    async fn run(
        &self,
        run_id: &str,
        window: &BoundingWindow,
        filter: &str,
    ) -> Result<MapArtifacts, PipelineError> {
        let started_at = Utc::now();
        let slug = window.slug();
        info!(filter, "Map run started");

        self.prune_workspaces().await;

        let workspace = self.workspaces.prepare(run_id).await?;
        let paths = ArtifactPaths::new(&workspace, &self.dataset, &slug);
        let stages = build_plan(&paths, window, filter, &self.render, &self.public_dir);

        let mut reports = Vec::with_capacity(stages.len());
        for stage in &stages {
            reports.push(self.execute_stage(stage).await?);
        }

        let (image, rivers, topo) = ArtifactPaths::published_names(&slug);
        let artifacts = MapArtifacts {
            run_id: run_id.to_string(),
            window: slug,
            workspace: workspace.dir().to_path_buf(),
            image: paths.final_image,
            topo: paths.countries_topojson,
            rivers: paths.rivers_topojson,
            published: PublishedArtifacts {
                image: self.public_dir.join(image),
                topo: self.public_dir.join(topo),
                rivers: self.public_dir.join(rivers),
            },
            stages: reports,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            stages = artifacts.stages.len(),
            image = %artifacts.image.display(),
            "Map run completed"
        );
        Ok(artifacts)
    }

    async fn execute_stage(&self, stage: &Stage) -> Result<StageReport, PipelineError> {
        for input in &stage.inputs {
            if tokio::fs::metadata(input).await.is_err() {
                record_stage(stage.id, "failed", 0.0);
                return Err(PipelineError::MissingInput {
                    stage: stage.id,
                    path: input.clone(),
                });
            }
        }

        info!(stage = %stage.id, "Stage started");
        let start = Instant::now();
        let result = self.perform(stage).await;
        let elapsed = start.elapsed();

        match result {
            Ok(()) => {
                record_stage(stage.id, "success", elapsed.as_secs_f64());
                info!(
                    stage = %stage.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Stage finished"
                );
                Ok(StageReport {
                    stage: stage.id,
                    duration_ms: elapsed.as_millis() as u64,
                })
            }
            Err(e) => {
                record_stage(stage.id, "failed", elapsed.as_secs_f64());
                Err(e)
            }
        }
    }

    async fn perform(&self, stage: &Stage) -> Result<(), PipelineError> {
        match &stage.action {
            StageAction::Run { invocation, post } => {
                let output = self
                    .runner
                    .run(invocation)
                    .await
                    .map_err(|source| PipelineError::Stage {
                        stage: stage.id,
                        source,
                    })?;
                debug!(
                    stage = %stage.id,
                    exit_code = output.exit_code,
                    stderr_lines = output.stderr_lines,
                    "Tool exited"
                );

                if let Some(PostProcess::RewriteTopology(path)) = post {
                    rewrite_topology_file(path)
                        .await
                        .map_err(|source| PipelineError::Topology {
                            stage: stage.id,
                            source,
                        })?;
                }
                Ok(())
            }
            StageAction::Publish { files, public_dir } => {
                let published = publish_files(files, public_dir).await.map_err(|source| {
                    PipelineError::Publish {
                        stage: stage.id,
                        source,
                    }
                })?;
                metrics::FILES_PUBLISHED.inc_by(published.len() as u64);
                for file in &published {
                    debug!(destination = %file.destination.display(), "Published artifact");
                }
                Ok(())
            }
        }
    }

    /// Drops old run workspaces; failures are logged and never fail the run.
    async fn prune_workspaces(&self) {
        let active = self.active_runs.read().await.clone();
        match self.workspaces.prune(self.keep_runs, &active).await {
            Ok(0) => {}
            Ok(removed) => {
                metrics::WORKSPACES_PRUNED.inc_by(removed as u64);
                debug!(removed, "Pruned old workspaces");
            }
            Err(e) => warn!(error = %e, "Failed to prune workspaces"),
        }
    }
}

fn record_stage(stage: StageId, result: &str, seconds: f64) {
    metrics::STAGE_DURATION
        .with_label_values(&[stage.name(), result])
        .observe(seconds);
    if result == "failed" {
        metrics::STAGE_FAILURES
            .with_label_values(&[stage.name()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::Country;
    use crate::request::CountrySelection;
    use crate::testing::MockToolRunner;
    use tempfile::TempDir;

    fn setup(temp: &TempDir) -> (Arc<MockToolRunner>, MapPipeline) {
        let mut config = Config::default();
        config.paths.source_dir = temp.path().join("original");
        config.paths.workspace_root = temp.path().join("data");
        config.paths.public_dir = temp.path().join("public");
        std::fs::create_dir_all(&config.paths.source_dir).unwrap();

        let runner = Arc::new(MockToolRunner::new());
        let catalog = CountryCatalog::new(vec![Country::new("Canada", "CAN", "North America")]).unwrap();
        let pipeline = MapPipeline::new(&config, runner.clone(), Arc::new(catalog));
        (runner, pipeline)
    }

    fn request() -> MapRequest {
        MapRequest {
            countries: vec![CountrySelection::code("USA")],
            continents: vec![],
            window: BoundingWindow::new(50.0, 30.0, -60.0, -130.0),
        }
    }

    #[tokio::test]
    async fn test_missing_dataset_fails_first_stage() {
        let temp = TempDir::new().unwrap();
        let (runner, pipeline) = setup(&temp);

        let err = pipeline.generate(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingInput {
                stage: StageId::CropBoundariesToSelection,
                ..
            }
        ));
        assert_eq!(runner.invocation_count().await, 0);
        assert_eq!(pipeline.status().await.total_failed, 1);
    }

    #[tokio::test]
    async fn test_rejected_request_does_not_touch_disk() {
        let temp = TempDir::new().unwrap();
        let (_, pipeline) = setup(&temp);

        let mut empty = request();
        empty.countries.clear();
        let err = pipeline.generate(&empty).await.unwrap_err();

        assert!(err.is_client_error());
        assert!(!temp.path().join("data").exists());
        assert_eq!(pipeline.status().await.total_failed, 0);
    }

    #[tokio::test]
    async fn test_status_reports_capacity() {
        let temp = TempDir::new().unwrap();
        let (_, pipeline) = setup(&temp);
        let status = pipeline.status().await;
        assert_eq!(status.max_concurrent_runs, 2);
        assert!(status.active_runs.is_empty());
        assert!(pipeline.latest().await.is_none());
    }
}
