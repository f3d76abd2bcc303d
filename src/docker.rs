//! Container lifecycle via `docker compose`.

use crate::config::{StackConfig, Workspace};
use crate::executor::{CommandExecutor, CommandOutput};
use anyhow::Result;
use tracing::debug;

/// Check that the docker CLI, the compose plugin and the daemon are all
/// reachable.
pub async fn docker_available(executor: &dyn CommandExecutor) -> bool {
    for args in [
        &["--version"][..],
        &["compose", "version"][..],
        &["ps"][..],
    ] {
        match executor.run("docker", args, None).await {
            Ok(output) if output.success => {}
            Ok(output) => {
                debug!("docker {} failed: {}", args.join(" "), output.output.trim());
                return false;
            }
            Err(err) => {
                debug!("docker {} failed: {err}", args.join(" "));
                return false;
            }
        }
    }
    true
}

/// Run `docker compose --project-name <stack> <args...>` in the stack
/// directory, streaming output to the terminal.
pub async fn compose(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
    args: &[&str],
) -> Result<CommandOutput> {
    let mut full_args = vec!["compose", "--project-name", config.stack_name.as_str()];
    full_args.extend_from_slice(args);

    let output = executor
        .run_streaming("docker", &full_args, Some(workspace.root()))
        .await?;
    if !output.success {
        anyhow::bail!("docker compose {} failed", args.join(" "));
    }
    Ok(output)
}

pub async fn up(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    compose(executor, workspace, config, &["up", "-d"]).await?;
    Ok(())
}

pub async fn down(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    compose(executor, workspace, config, &["down"]).await?;
    Ok(())
}

pub async fn restart(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    compose(executor, workspace, config, &["restart"]).await?;
    Ok(())
}

/// Stop the stack and remove all data volumes. Destructive.
pub async fn reset(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    compose(executor, workspace, config, &["down", "-v"]).await?;
    Ok(())
}

pub async fn status(
    executor: &dyn CommandExecutor,
    workspace: &Workspace,
    config: &StackConfig,
) -> Result<()> {
    compose(executor, workspace, config, &["ps"]).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    /// Records invocations instead of spawning processes.
    struct RecordingExecutor {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        success: bool,
    }

    impl RecordingExecutor {
        fn new(success: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                success,
            }
        }

        fn record(&self, program: &str, args: &[&str]) -> CommandOutput {
            self.calls.lock().unwrap().push((
                program.to_string(),
                args.iter().map(|s| s.to_string()).collect(),
            ));
            CommandOutput {
                success: self.success,
                output: String::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl CommandExecutor for RecordingExecutor {
        async fn run(
            &self,
            program: &str,
            args: &[&str],
            _working_dir: Option<&Path>,
        ) -> Result<CommandOutput> {
            Ok(self.record(program, args))
        }

        async fn run_streaming(
            &self,
            program: &str,
            args: &[&str],
            _working_dir: Option<&Path>,
        ) -> Result<CommandOutput> {
            Ok(self.record(program, args))
        }
    }

    #[tokio::test]
    async fn compose_prepends_project_name() {
        let executor = RecordingExecutor::new(true);
        let workspace = Workspace::new(".");
        let config = StackConfig::default();

        up(&executor, &workspace, &config).await.unwrap();

        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "docker");
        assert_eq!(
            calls[0].1,
            vec!["compose", "--project-name", "easy-opal", "up", "-d"]
        );
    }

    #[tokio::test]
    async fn compose_failure_becomes_an_error() {
        let executor = RecordingExecutor::new(false);
        let workspace = Workspace::new(".");
        let config = StackConfig::default();

        let result = down(&executor, &workspace, &config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn availability_check_requires_all_probes() {
        let executor = RecordingExecutor::new(false);
        assert!(!docker_available(&executor).await);

        let executor = RecordingExecutor::new(true);
        assert!(docker_available(&executor).await);
        // --version, compose version, ps
        assert_eq!(executor.calls.lock().unwrap().len(), 3);
    }
}
