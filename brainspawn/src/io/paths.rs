//! Canonical locations of the backing sources.

use std::path::{Path, PathBuf};

/// Project file name under `<root>/.vscode/`.
pub const CONFIG_FILENAME: &str = "brain-spawn.json";
/// Project-scoped override of user settings. Read only to be ignored.
pub const PROJECT_SETTINGS_FILENAME: &str = "brain-spawn.settings.toml";
/// Directory under the user config dir holding tool files.
pub const USER_DIR_NAME: &str = "brain-spawn";

/// All canonical paths within a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub vscode_dir: PathBuf,
    pub config_path: PathBuf,
    pub settings_override_path: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let vscode_dir = root.join(".vscode");
        Self {
            root: root.clone(),
            config_path: vscode_dir.join(CONFIG_FILENAME),
            settings_override_path: vscode_dir.join(PROJECT_SETTINGS_FILENAME),
            vscode_dir,
        }
    }
}

/// Paths under the per-user config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPaths {
    pub dir: PathBuf,
    pub settings_path: PathBuf,
    pub tool_config_path: PathBuf,
}

impl UserPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            settings_path: dir.join("settings.toml"),
            tool_config_path: dir.join("config.toml"),
            dir,
        }
    }

    /// `<config dir>/brain-spawn`, if the platform has a config dir.
    pub fn discover() -> Option<Self> {
        dirs::config_dir().map(|base| Self::new(base.join(USER_DIR_NAME)))
    }
}

/// True if `path` names the same file as `target`.
///
/// Parents are compared after canonicalization because watcher backends may
/// report paths through a different but equivalent directory.
pub fn same_file(path: &Path, target: &Path) -> bool {
    if path == target {
        return true;
    }
    if path.file_name() != target.file_name() {
        return false;
    }
    let canonical_parent = |p: &Path| p.parent().and_then(|dir| dir.canonicalize().ok());
    match (canonical_parent(path), canonical_parent(target)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
