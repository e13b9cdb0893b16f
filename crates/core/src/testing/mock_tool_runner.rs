//! Mock tool runner for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::{DatasetConfig, RenderConfig};
use crate::pipeline::{build_plan, ArtifactPaths, StageId};
use crate::request::BoundingWindow;
use crate::runner::{OutputSink, RunnerError, Tool, ToolInvocation, ToolOutput, ToolRunner};

/// Topology written to file sinks unless overridden.
pub const DEFAULT_TOPOLOGY: &str = r#"{"type":"Topology","arcs":[],"objects":{"countries":{"type":"GeometryCollection","geometries":[{"type":"Polygon","arcs":[],"properties":{"NAME":"United States of America","SOV_A3":"US1","POP_EST":328239523}}]}}}"#;

/// A failure rule: invocations producing a file with this suffix exit non-zero.
#[derive(Debug, Clone)]
struct FailureRule {
    output_suffix: String,
    exit_code: i32,
}

/// Mock implementation of the ToolRunner trait.
///
/// Provides controllable behavior for testing:
/// - Records every invocation for assertions
/// - Creates each invocation's declared outputs
/// - Writes canned topology content to file sinks
/// - Fails selected stages with a chosen exit code
///
/// # Example
///
/// ```rust,ignore
/// use reliefmap_core::testing::MockToolRunner;
/// use reliefmap_core::StageId;
///
/// let runner = MockToolRunner::new();
/// runner.fail_stage(StageId::ReprojectElevation, 1).await;
///
/// // ... run the pipeline ...
///
/// assert_eq!(runner.invocation_count().await, 7);
/// ```
#[derive(Debug)]
pub struct MockToolRunner {
    invocations: Arc<RwLock<Vec<ToolInvocation>>>,
    failures: Arc<RwLock<Vec<FailureRule>>>,
    topology: Arc<RwLock<String>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl Default for MockToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockToolRunner {
    /// Create a new mock runner where every tool succeeds.
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(Vec::new())),
            topology: Arc::new(RwLock::new(DEFAULT_TOPOLOGY.to_string())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded invocations, in call order.
    pub async fn recorded_invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.read().await.clone()
    }

    /// Get the number of invocations performed.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Tools launched so far, in call order.
    pub async fn tools_run(&self) -> Vec<Tool> {
        self.invocations.read().await.iter().map(|i| i.tool).collect()
    }

    /// Clear recorded invocations.
    pub async fn clear_recorded(&self) {
        self.invocations.write().await.clear();
    }

    /// Make the tool of `stage` exit with `exit_code`.
    ///
    /// The publish stage launches no tool and cannot be failed this way.
    pub async fn fail_stage(&self, stage: StageId, exit_code: i32) {
        if let Some(suffix) = stage_output_suffix(stage) {
            self.failures.write().await.push(FailureRule {
                output_suffix: suffix,
                exit_code,
            });
        }
    }

    /// Remove all failure rules.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Content appended to file sinks (the `geo2topo` output).
    pub async fn set_topology_content(&self, content: impl Into<String>) {
        *self.topology.write().await = content.into();
    }

    /// Simulated run time of every invocation.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    async fn failure_for(&self, invocation: &ToolInvocation) -> Option<i32> {
        let failures = self.failures.read().await;
        failures.iter().find_map(|rule| {
            invocation
                .outputs
                .iter()
                .any(|output| output.to_string_lossy().ends_with(&rule.output_suffix))
                .then_some(rule.exit_code)
        })
    }

    async fn write_outputs(&self, invocation: &ToolInvocation) -> Result<(), RunnerError> {
        let topology = self.topology.read().await.clone();
        for output in &invocation.outputs {
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            match &invocation.sink {
                OutputSink::File(sink) if sink == output => {
                    let mut file = tokio::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(sink)
                        .await
                        .map_err(|source| RunnerError::SinkFailed {
                            path: sink.clone(),
                            source,
                        })?;
                    file.write_all(topology.as_bytes()).await?;
                }
                _ => tokio::fs::write(output, b"mock").await?,
            }
        }
        Ok(())
    }
}

/// File name of the artifact `stage` produces, with the window slug left out.
fn stage_output_suffix(stage: StageId) -> Option<String> {
    let paths = ArtifactPaths::in_dir(Path::new(""), &DatasetConfig::default(), "");
    let window = BoundingWindow::new(1.0, 0.0, 1.0, 0.0);
    build_plan(&paths, &window, "", &RenderConfig::default(), Path::new(""))
        .into_iter()
        .find(|s| s.id == stage)
        .and_then(|s| s.invocation().and_then(|i| i.outputs.first().cloned()))
        .and_then(|output| output.file_name().map(|n| n.to_string_lossy().to_string()))
}

#[async_trait]
impl ToolRunner for MockToolRunner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunnerError> {
        let start = Instant::now();
        self.invocations.write().await.push(invocation.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(exit_code) = self.failure_for(invocation).await {
            return Err(RunnerError::non_zero_exit(
                invocation.tool.name(),
                Some(exit_code),
                Some(format!("mock failure of {}", invocation.tool)),
            ));
        }

        self.write_outputs(invocation).await?;

        Ok(ToolOutput {
            exit_code: 0,
            duration_ms: start.elapsed().as_millis() as u64,
            stderr_lines: 0,
        })
    }

    async fn validate(&self) -> Result<(), RunnerError> {
        Ok(())
    }
}
