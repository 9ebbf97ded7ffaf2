//! Project-scoped configuration file (`.vscode/brain-spawn.json`).

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::schema::validate_config;
use crate::core::types::{BrainSpawnConfig, SpawnGroup};

/// Outcome of reading the project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFile {
    /// No file on disk.
    Missing,
    Loaded(BrainSpawnConfig),
}

/// Read and validate the project file.
///
/// A missing file is not an error. Anything else that prevents a valid
/// config (I/O, JSON syntax, validation) is returned as `Err`.
pub fn read_project_file(path: &Path) -> Result<ProjectFile> {
    debug!(path = %path.display(), "reading project file");
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ProjectFile::Missing),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    let raw: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse {}", path.display()))?;
    let config = validate_config(&raw)?;
    debug!(groups = config.groups.len(), "project file loaded");
    Ok(ProjectFile::Loaded(config))
}

#[derive(Serialize)]
struct PersistedConfig<'a> {
    version: u32,
    groups: &'a [SpawnGroup],
}

/// Write `groups` (already stripped of their source tag) to the project file.
///
/// Creates the parent directory if needed and replaces the file atomically.
pub fn write_project_file(path: &Path, version: u32, groups: &[SpawnGroup]) -> Result<()> {
    debug!(path = %path.display(), groups = groups.len(), "writing project file");
    let mut buf = serde_json::to_string_pretty(&PersistedConfig { version, groups })
        .context("serialize project config")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Remove the project file. Returns `true` if a file was deleted.
pub fn delete_project_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "deleted project file");
            Ok(true)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("delete {}", path.display())),
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
