//! Process-based runner implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::error::RunnerError;
use super::traits::ToolRunner;
use super::types::{OutputSink, Tool, ToolInvocation, ToolOutput};
use crate::config::ToolsConfig;

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Runs tools as child processes of the server.
pub struct ProcessRunner {
    tools: ToolsConfig,
    stage_timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Creates a runner; `stage_timeout` of `None` lets a tool run indefinitely.
    pub fn new(tools: ToolsConfig, stage_timeout: Option<Duration>) -> Self {
        Self {
            tools,
            stage_timeout,
        }
    }

    /// Creates a runner with default tool paths and no timeout.
    pub fn with_defaults() -> Self {
        Self::new(ToolsConfig::default(), None)
    }

    fn build_command(&self, invocation: &ToolInvocation) -> Result<Command, RunnerError> {
        let mut command = Command::new(invocation.tool.binary(&self.tools));
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match &invocation.sink {
            OutputSink::Log => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputSink::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| RunnerError::SinkFailed {
                        path: path.clone(),
                        source,
                    })?;
                let err_file = file.try_clone().map_err(|source| RunnerError::SinkFailed {
                    path: path.clone(),
                    source,
                })?;
                command.stdout(Stdio::from(file)).stderr(Stdio::from(err_file));
            }
        }

        Ok(command)
    }

    async fn check_tool(&self, tool: Tool) -> Result<(), RunnerError> {
        let path = tool.binary(&self.tools);
        let result = Command::new(path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RunnerError::ToolNotFound {
                tool: tool.name().to_string(),
                path: path.to_path_buf(),
            }),
            Err(e) => Err(RunnerError::Io(e)),
        }
    }
}

/// Forwards stdout lines to the debug log.
async fn drain_stdout<R: AsyncRead + Unpin>(tool: Tool, stream: R) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(tool = %tool, "stdout: {}", line);
    }
}

/// Forwards stderr lines to the log, returning the line count and the tail.
async fn drain_stderr<R: AsyncRead + Unpin>(tool: Tool, stream: R) -> (usize, Vec<String>) {
    let mut lines = BufReader::new(stream).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut count = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        warn!(tool = %tool, "stderr: {}", line);
        count += 1;
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    (count, tail.into_iter().collect())
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunnerError> {
        let start = Instant::now();
        let tool = invocation.tool;
        debug!(command = %invocation.command_line(), "Spawning tool");

        let mut child = self
            .build_command(invocation)?
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RunnerError::ToolNotFound {
                        tool: tool.name().to_string(),
                        path: tool.binary(&self.tools).to_path_buf(),
                    }
                } else {
                    RunnerError::Spawn {
                        command: tool.name().to_string(),
                        source: e,
                    }
                }
            })?;

        let stdout_task = child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(drain_stdout(tool, stdout)));
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(tool, stderr)));

        let status = match self.stage_timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(RunnerError::Timeout {
                        command: tool.name().to_string(),
                        timeout: limit,
                    });
                }
            },
            None => child.wait().await?,
        };

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        let (stderr_lines, tail) = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => (0, Vec::new()),
        };

        if !status.success() {
            return Err(RunnerError::non_zero_exit(
                tool.name(),
                status.code(),
                if tail.is_empty() {
                    None
                } else {
                    Some(tail.join("\n"))
                },
            ));
        }

        Ok(ToolOutput {
            exit_code: status.code().unwrap_or(0),
            duration_ms: start.elapsed().as_millis() as u64,
            stderr_lines,
        })
    }

    async fn validate(&self) -> Result<(), RunnerError> {
        let mut missing = Vec::new();
        for tool in Tool::ALL {
            match self.check_tool(tool).await {
                Ok(()) => {}
                Err(RunnerError::ToolNotFound { tool, path }) => missing.push((tool, path)),
                Err(e) => return Err(e),
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RunnerError::ToolsMissing { missing })
        }
    }
}
