//! Merged configuration store.
//!
//! Groups come from two independently editable sources: the project file
//! (tagged [`GroupSource::Workspace`]) and the global user setting (tagged
//! [`GroupSource::User`]). The store keeps one validated snapshot of both,
//! replaces it wholesale on every load, and routes edits back to the source
//! each group came from.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::schema::validate_groups;
use crate::core::types::{BrainSpawnConfig, CONFIG_VERSION, GroupSource, SpawnGroup};
use crate::host::Notifier;
use crate::io::paths::ProjectPaths;
use crate::io::project_file::{
    ProjectFile, delete_project_file, read_project_file, write_project_file,
};
use crate::io::settings::{GROUPS_KEY, SettingsStore};
use crate::io::watcher::{SourceChange, WatchTargets};

/// Why subscribers are being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    Initial,
    ProjectFileChanged,
    SettingsChanged,
    /// Reload that follows [`ConfigStore::save_all`].
    Saved,
}

impl From<SourceChange> for ChangeReason {
    fn from(change: SourceChange) -> Self {
        match change {
            SourceChange::ProjectFile => ChangeReason::ProjectFileChanged,
            SourceChange::UserSettings => ChangeReason::SettingsChanged,
        }
    }
}

/// Payload delivered to subscribers after a reload.
#[derive(Debug, Clone)]
pub struct ConfigChangeEvent {
    pub config: Arc<BrainSpawnConfig>,
    pub reason: ChangeReason,
}

/// Handle returned by [`ConfigStore::on_change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

type Listener = Box<dyn FnMut(&ConfigChangeEvent) -> Result<()> + Send>;

/// Owns the merged snapshot and both backing sources.
pub struct ConfigStore {
    project: Option<ProjectPaths>,
    settings: Box<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    snapshot: Arc<BrainSpawnConfig>,
    loaded: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("project", &self.project)
            .field("snapshot", &self.snapshot)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Create an empty, not yet loaded store.
    ///
    /// `project_root` is the primary project folder, if one is open.
    pub fn new(
        project_root: Option<&Path>,
        settings: Box<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            project: project_root.map(ProjectPaths::new),
            settings,
            notifier,
            snapshot: Arc::new(BrainSpawnConfig::default()),
            loaded: false,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Current snapshot. Never triggers a load.
    pub fn config(&self) -> Arc<BrainSpawnConfig> {
        Arc::clone(&self.snapshot)
    }

    /// True once the first load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project.as_ref().map(|paths| paths.root.as_path())
    }

    pub fn project_file_path(&self) -> Option<&Path> {
        self.project.as_ref().map(|paths| paths.config_path.as_path())
    }

    pub fn settings_path(&self) -> Option<&Path> {
        self.settings.global_path()
    }

    /// Files a watcher should observe to keep this store current.
    pub fn watch_targets(&self) -> WatchTargets {
        WatchTargets {
            project_file: self.project_file_path().map(Path::to_path_buf),
            settings_file: self.settings_path().map(Path::to_path_buf),
        }
    }

    /// Rebuild the snapshot from both sources.
    ///
    /// Never fails: a source that cannot be read or validated contributes no
    /// groups and a warning goes to the notifier.
    pub fn load(&mut self) -> Arc<BrainSpawnConfig> {
        let mut groups: Vec<SpawnGroup> = self
            .load_workspace_groups()
            .into_iter()
            .map(|group| group.with_source(GroupSource::Workspace))
            .collect();
        let workspace_count = groups.len();
        groups.extend(
            self.load_user_groups()
                .into_iter()
                .map(|group| group.with_source(GroupSource::User)),
        );

        debug!(
            workspace = workspace_count,
            user = groups.len() - workspace_count,
            "config loaded"
        );
        self.snapshot = Arc::new(BrainSpawnConfig {
            version: CONFIG_VERSION,
            groups,
        });
        self.loaded = true;
        self.config()
    }

    /// Load and notify subscribers.
    pub fn refresh(&mut self, reason: ChangeReason) -> Arc<BrainSpawnConfig> {
        let config = self.load();
        self.notify(&ConfigChangeEvent {
            config: Arc::clone(&config),
            reason,
        });
        config
    }

    /// React to an external change of a backing source.
    pub fn handle_source_change(&mut self, change: SourceChange) -> Arc<BrainSpawnConfig> {
        info!(?change, "backing source changed, reloading");
        self.refresh(change.into())
    }

    /// Persist every group to the source named by its tag, then reload.
    ///
    /// Workspace groups replace the project file (deleted when there are
    /// none); user groups replace the global setting (cleared when there are
    /// none). Groups without a tag belong to neither source and are dropped.
    pub fn save_all(&mut self, config: &BrainSpawnConfig) -> Result<()> {
        let workspace: Vec<SpawnGroup> = config
            .groups_from(GroupSource::Workspace)
            .map(SpawnGroup::without_source)
            .collect();
        let user: Vec<SpawnGroup> = config
            .groups_from(GroupSource::User)
            .map(SpawnGroup::without_source)
            .collect();

        let untagged = config.groups.len() - workspace.len() - user.len();
        if untagged > 0 {
            warn!(untagged, "dropping groups without a source on save");
        }

        if self.project.is_none() && !workspace.is_empty() {
            return Err(anyhow!("No workspace folder open"));
        }
        let user_value = if user.is_empty() {
            None
        } else {
            Some(serde_json::to_value(&user)?)
        };

        // Once anything may have been written, reload whatever reached disk
        // before reporting the first failure.
        let written = self
            .write_workspace_groups(config.version, &workspace)
            .and_then(|()| self.settings.update_global(GROUPS_KEY, user_value));
        match &written {
            Ok(()) => info!(
                workspace = workspace.len(),
                user = user.len(),
                "config saved"
            ),
            Err(err) => warn!(error = %format!("{err:#}"), "config save failed"),
        }
        self.refresh(ChangeReason::Saved);
        written
    }

    fn write_workspace_groups(&self, version: u32, workspace: &[SpawnGroup]) -> Result<()> {
        let Some(paths) = &self.project else {
            return Ok(());
        };
        if workspace.is_empty() {
            delete_project_file(&paths.config_path)?;
        } else {
            write_project_file(&paths.config_path, version, workspace)?;
        }
        Ok(())
    }

    /// Subscribe to reloads. Listeners run in subscription order.
    pub fn on_change(
        &mut self,
        listener: impl FnMut(&ConfigChangeEvent) -> Result<()> + Send + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: &ConfigChangeEvent) {
        for (id, listener) in &mut self.listeners {
            if let Err(err) = listener(event) {
                warn!(listener = id.0, error = %err, "config listener failed");
                self.notifier
                    .warn(&format!("Brain Spawn: config listener failed — {err:#}"));
            }
        }
    }

    fn load_workspace_groups(&self) -> Vec<SpawnGroup> {
        let Some(paths) = &self.project else {
            return Vec::new();
        };
        match read_project_file(&paths.config_path) {
            Ok(ProjectFile::Loaded(config)) => config.groups,
            Ok(ProjectFile::Missing) => Vec::new(),
            Err(err) => {
                self.notifier
                    .warn(&format!("Brain Spawn: Invalid config — {err:#}"));
                Vec::new()
            }
        }
    }

    fn load_user_groups(&self) -> Vec<SpawnGroup> {
        let inspection = match self.settings.inspect(GROUPS_KEY) {
            Ok(inspection) => inspection,
            Err(err) => {
                self.notifier
                    .warn(&format!("Brain Spawn: Invalid user settings — {err:#}"));
                return Vec::new();
            }
        };
        if inspection.workspace_value.is_some() {
            debug!("ignoring project-scoped {GROUPS_KEY}");
        }

        let raw = match inspection.global_value {
            None => return Vec::new(),
            Some(Value::Array(raw)) if raw.is_empty() => return Vec::new(),
            Some(Value::Array(raw)) => raw,
            Some(_) => {
                self.notifier.warn(
                    "Brain Spawn: Invalid user settings — Configuration must have a \"groups\" array",
                );
                return Vec::new();
            }
        };
        match validate_groups(&raw) {
            Ok(groups) => groups,
            Err(err) => {
                self.notifier
                    .warn(&format!("Brain Spawn: Invalid user settings — {err}"));
                Vec::new()
            }
        }
    }
}
