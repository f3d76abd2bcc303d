//! External command execution. Everything that shells out (docker, mkcert,
//! git) goes through the [`CommandExecutor`] trait so command handlers can
//! be exercised without the real binaries installed.

use anyhow::Result;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub output: String,
}

#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a program and capture its merged output.
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput>;

    /// Run a program, echoing each output line to the terminal while also
    /// capturing it. Used for long-running commands like `docker compose up`.
    async fn run_streaming(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput>;
}

pub struct DefaultCommandExecutor;

fn validate_working_dir(working_dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = working_dir {
        if !dir.exists() {
            anyhow::bail!("Working directory does not exist: {}", dir.display());
        }
        if !dir.is_dir() {
            anyhow::bail!("Path is not a directory: {}", dir.display());
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl CommandExecutor for DefaultCommandExecutor {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput> {
        validate_working_dir(working_dir)?;
        debug!("running: {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            combined.push_str(&stderr);
        }

        Ok(CommandOutput {
            success: output.status.success(),
            output: combined,
        })
    }

    async fn run_streaming(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput> {
        validate_working_dir(working_dir)?;
        debug!("running (streaming): {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take().expect("stdout is piped");
        let stderr = child.stderr.take().expect("stderr is piped");

        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();

        let mut accumulated = String::new();
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !stdout_done || !stderr_done {
            tokio::select! {
                line = stdout_lines.next_line(), if !stdout_done => {
                    match line? {
                        Some(line) => {
                            println!("{line}");
                            accumulated.push_str(&line);
                            accumulated.push('\n');
                        }
                        None => stdout_done = true,
                    }
                }
                line = stderr_lines.next_line(), if !stderr_done => {
                    match line? {
                        Some(line) => {
                            eprintln!("{line}");
                            accumulated.push_str(&line);
                            accumulated.push('\n');
                        }
                        None => stderr_done = true,
                    }
                }
            }
        }

        let status = child.wait().await?;
        Ok(CommandOutput {
            success: status.success(),
            output: accumulated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_output_and_status() {
        let executor = DefaultCommandExecutor;
        let result = executor.run("echo", &["hello"], None).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output.trim(), "hello");
    }

    #[tokio::test]
    async fn reports_failure_status() {
        let executor = DefaultCommandExecutor;
        let result = executor.run("false", &[], None).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn streaming_accumulates_lines() {
        let executor = DefaultCommandExecutor;
        let result = executor
            .run_streaming("printf", &["one\ntwo\n"], None)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "one\ntwo\n");
    }

    #[tokio::test]
    async fn rejects_missing_working_dir() {
        let executor = DefaultCommandExecutor;
        let missing = Path::new("/does/not/exist");
        let result = executor.run("echo", &["hi"], Some(missing)).await;
        assert!(result.is_err());
    }
}
