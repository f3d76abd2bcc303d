//! Configuration snapshots: timestamped copies of `config.json` and
//! `docker-compose.yml` under `backups/`, taken before any mutating command.

use crate::config::Workspace;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use similar::TextDiff;
use std::path::PathBuf;
use tracing::{debug, info};

/// Files captured by a snapshot.
pub const SNAPSHOT_FILES: [&str; 2] = ["config.json", "docker-compose.yml"];

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Directory name, e.g. `20260827_153012`.
    pub id: String,
    pub path: PathBuf,
    pub time: NaiveDateTime,
}

/// Copy the current configuration files into a new timestamped snapshot
/// directory. Returns `None` when there is nothing to capture yet.
pub fn create(workspace: &Workspace) -> Result<Option<Snapshot>> {
    let sources: Vec<PathBuf> = SNAPSHOT_FILES
        .iter()
        .map(|name| workspace.root().join(name))
        .filter(|path| path.exists())
        .collect();
    if sources.is_empty() {
        debug!("nothing to snapshot yet");
        return Ok(None);
    }

    // Two mutating commands within the same second would collide on the
    // id; bump the timestamp until the directory name is free.
    let mut time = chrono::Local::now().naive_local();
    let mut id = time.format(TIMESTAMP_FORMAT).to_string();
    let mut path = workspace.backups_dir().join(&id);
    while path.exists() {
        time += chrono::Duration::seconds(1);
        id = time.format(TIMESTAMP_FORMAT).to_string();
        path = workspace.backups_dir().join(&id);
    }
    std::fs::create_dir_all(&path)
        .with_context(|| format!("failed to create snapshot dir {}", path.display()))?;

    for source in sources {
        let file_name = source.file_name().expect("snapshot sources are files");
        std::fs::copy(&source, path.join(file_name))
            .with_context(|| format!("failed to snapshot {}", source.display()))?;
    }

    info!("snapshot {} created", id);
    Ok(Some(Snapshot { id, path, time }))
}

/// All snapshots, newest first. Directories that do not parse as a
/// timestamp are ignored.
pub fn list(workspace: &Workspace) -> Result<Vec<Snapshot>> {
    let backups_dir = workspace.backups_dir();
    if !backups_dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    for entry in std::fs::read_dir(&backups_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Ok(time) = NaiveDateTime::parse_from_str(&name, TIMESTAMP_FORMAT) {
            snapshots.push(Snapshot {
                id: name,
                path: entry.path(),
                time,
            });
        }
    }

    snapshots.sort_by(|a, b| b.time.cmp(&a.time));
    Ok(snapshots)
}

pub fn find(workspace: &Workspace, id: &str) -> Result<Option<Snapshot>> {
    Ok(list(workspace)?.into_iter().find(|s| s.id == id))
}

/// Contents of each file captured by the snapshot, for previewing before a
/// restore.
pub fn read_files(snapshot: &Snapshot) -> Result<Vec<(String, String)>> {
    let mut files = Vec::new();
    for name in SNAPSHOT_FILES {
        let path = snapshot.path.join(name);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            files.push((name.to_string(), contents));
        }
    }
    Ok(files)
}

/// Unified diff of each snapshot file against the current tree. Files with
/// no differences are omitted; a file missing from the snapshot is skipped.
pub fn diff_against_current(workspace: &Workspace, snapshot: &Snapshot) -> Result<Vec<(String, String)>> {
    let mut diffs = Vec::new();
    for name in SNAPSHOT_FILES {
        let snapshot_file = snapshot.path.join(name);
        if !snapshot_file.exists() {
            continue;
        }
        let snapshot_content = std::fs::read_to_string(&snapshot_file)?;

        let current_file = workspace.root().join(name);
        let current_content = if current_file.exists() {
            std::fs::read_to_string(&current_file)?
        } else {
            String::new()
        };

        if snapshot_content == current_content {
            continue;
        }

        let diff = TextDiff::from_lines(&current_content, &snapshot_content)
            .unified_diff()
            .header(&format!("current/{name}"), &format!("snapshot/{name}"))
            .to_string();
        diffs.push((name.to_string(), diff));
    }
    Ok(diffs)
}

/// Copy the snapshot files back into the working directory.
pub fn restore(workspace: &Workspace, snapshot: &Snapshot) -> Result<()> {
    for name in SNAPSHOT_FILES {
        let snapshot_file = snapshot.path.join(name);
        if snapshot_file.exists() {
            std::fs::copy(&snapshot_file, workspace.root().join(name))
                .with_context(|| format!("failed to restore {name}"))?;
        }
    }
    info!("configuration restored from snapshot {}", snapshot.id);
    Ok(())
}
