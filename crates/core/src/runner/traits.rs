//! Trait definitions for the runner module.

use async_trait::async_trait;

use super::error::RunnerError;
use super::types::{ToolInvocation, ToolOutput};

/// Something that can execute external tool invocations.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs one invocation to completion.
    ///
    /// Succeeds iff the process exits with status zero.
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunnerError>;

    /// Validates that every tool the pipeline needs can be launched.
    async fn validate(&self) -> Result<(), RunnerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Tool;

    struct EchoRunner;

    #[async_trait]
    impl ToolRunner for EchoRunner {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, RunnerError> {
            if invocation.args.iter().any(|a| a == "--fail") {
                return Err(RunnerError::non_zero_exit(invocation.tool.name(), Some(2), None));
            }
            Ok(ToolOutput {
                exit_code: 0,
                duration_ms: 1,
                stderr_lines: 0,
            })
        }

        async fn validate(&self) -> Result<(), RunnerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runner_as_trait_object() {
        let runner: Box<dyn ToolRunner> = Box::new(EchoRunner);
        let ok = runner
            .run(&ToolInvocation::new(Tool::Gdaldem, vec!["hillshade".to_string()]))
            .await
            .unwrap();
        assert_eq!(ok.exit_code, 0);

        let err = runner
            .run(&ToolInvocation::new(Tool::Gdaldem, vec!["--fail".to_string()]))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(runner.name(), "echo");
    }
}
