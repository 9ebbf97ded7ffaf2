//! `${...}` variable expansion for launch-time values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(workspaceFolder|workspaceFolderBasename|env:[^}]+)\}")
        .expect("token pattern compiles")
});

/// Values available to [`substitute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionContext {
    pub workspace_folder: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl SubstitutionContext {
    pub fn new(workspace_folder: Option<PathBuf>, env: BTreeMap<String, String>) -> Self {
        Self {
            workspace_folder,
            env,
        }
    }

    /// Snapshot the current process environment.
    pub fn from_process(workspace_folder: Option<&Path>) -> Self {
        Self::new(workspace_folder.map(Path::to_path_buf), std::env::vars().collect())
    }

    fn folder(&self) -> String {
        self.workspace_folder
            .as_deref()
            .map(|path| path.display().to_string())
            .unwrap_or_default()
    }

    fn folder_basename(&self) -> String {
        self.workspace_folder
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Expand `${workspaceFolder}`, `${workspaceFolderBasename}` and `${env:NAME}`.
///
/// Single left-to-right pass: replacement text is never expanded again, and
/// unknown `${...}` tokens are kept as written.
pub fn substitute(text: &str, ctx: &SubstitutionContext) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            let token = &caps[1];
            match token {
                "workspaceFolder" => ctx.folder(),
                "workspaceFolderBasename" => ctx.folder_basename(),
                _ => token
                    .strip_prefix("env:")
                    .and_then(|name| ctx.env.get(name))
                    .cloned()
                    .unwrap_or_default(),
            }
        })
        .into_owned()
}
