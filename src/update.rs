//! Self-update by pulling the official git repository.

use crate::executor::CommandExecutor;
use crate::prompt::Prompter;
use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    Behind,
    Diverged,
}

/// Classify `git status -uno` output relative to the upstream branch.
pub fn classify_status(status_output: &str) -> UpdateStatus {
    if status_output.contains("Your branch is up to date") {
        UpdateStatus::UpToDate
    } else if status_output.contains("Your branch is behind") {
        UpdateStatus::Behind
    } else {
        UpdateStatus::Diverged
    }
}

async fn git(
    executor: &dyn CommandExecutor,
    repo_dir: &Path,
    args: &[&str],
) -> Result<String> {
    let output = executor
        .run("git", args, Some(repo_dir))
        .await
        .context("is git installed?")?;
    if !output.success {
        anyhow::bail!("git {} failed: {}", args.join(" "), output.output.trim());
    }
    Ok(output.output)
}

pub async fn run(executor: &dyn CommandExecutor, repo_dir: &Path) -> Result<()> {
    println!("Checking for updates...");

    git(executor, repo_dir, &["fetch"])
        .await
        .context("failed to fetch updates from the remote repository")?;

    let status_output = git(executor, repo_dir, &["status", "-uno"]).await?;
    match classify_status(&status_output) {
        UpdateStatus::UpToDate => {
            println!("You are already on the latest version.");
            return Ok(());
        }
        UpdateStatus::Diverged => {
            println!(
                "Could not determine update status; your branch may have diverged or \
                 has local commits. Use 'git status' and 'git pull' manually."
            );
            return Ok(());
        }
        UpdateStatus::Behind => {}
    }

    let mut prompter = Prompter::new()?;

    let dirty = !git(executor, repo_dir, &["status", "--porcelain"])
        .await?
        .trim()
        .is_empty();
    if dirty {
        println!("You have local changes that are not committed; pulling may cause conflicts.");
        if !prompter.confirm("Do you want to attempt to pull anyway?", false)? {
            println!("Update aborted.");
            return Ok(());
        }
    }

    println!("A new version is available!");
    if !prompter.confirm("Download and apply the update now?", true)? {
        return Ok(());
    }

    let output = executor
        .run_streaming("git", &["pull"], Some(repo_dir))
        .await?;
    if !output.success {
        anyhow::bail!("failed to apply updates");
    }
    println!("\nUpdate successful!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_git_status_output() {
        assert_eq!(
            classify_status("On branch main\nYour branch is up to date with 'origin/main'.\n"),
            UpdateStatus::UpToDate
        );
        assert_eq!(
            classify_status(
                "On branch main\nYour branch is behind 'origin/main' by 2 commits.\n"
            ),
            UpdateStatus::Behind
        );
        assert_eq!(
            classify_status("On branch main\nYour branch and 'origin/main' have diverged.\n"),
            UpdateStatus::Diverged
        );
    }
}
