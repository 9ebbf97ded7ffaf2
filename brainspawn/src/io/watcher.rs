//! File watching for the two backing sources.
//!
//! Each source file's parent directory is polled non-recursively. When a
//! parent does not exist yet (no `.vscode/` in a fresh project), its nearest
//! existing ancestor is polled instead and the real parent is added once it
//! appears.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::io::paths::same_file;

/// Which backing source changed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceChange {
    ProjectFile,
    UserSettings,
}

/// Files to watch. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchTargets {
    pub project_file: Option<PathBuf>,
    pub settings_file: Option<PathBuf>,
}

impl WatchTargets {
    /// Map a raw watcher event onto the sources it touches.
    pub fn classify(&self, event: &NotifyEvent) -> Vec<SourceChange> {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
        ) {
            return Vec::new();
        }

        let mut changes = Vec::new();
        for path in &event.paths {
            let touched = [
                (self.project_file.as_deref(), SourceChange::ProjectFile),
                (self.settings_file.as_deref(), SourceChange::UserSettings),
            ];
            for (target, change) in touched {
                if let Some(target) = target
                    && same_file(path, target)
                    && !changes.contains(&change)
                {
                    changes.push(change);
                }
            }
        }
        changes
    }

    fn files(&self) -> impl Iterator<Item = &Path> {
        self.project_file
            .as_deref()
            .into_iter()
            .chain(self.settings_file.as_deref())
    }
}

/// Polls the backing sources and yields [`SourceChange`]s.
pub struct SourceWatcher {
    watcher: PollWatcher,
    targets: WatchTargets,
    /// Parent directories that did not exist when watching started.
    pending_dirs: Vec<PathBuf>,
    raw_rx: mpsc::Receiver<NotifyEvent>,
    queued: VecDeque<SourceChange>,
}

impl std::fmt::Debug for SourceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceWatcher")
            .field("targets", &self.targets)
            .field("pending_dirs", &self.pending_dirs)
            .finish_non_exhaustive()
    }
}

impl SourceWatcher {
    pub fn new(targets: WatchTargets, poll_interval: Duration) -> Result<Self> {
        let (tx, raw_rx) = mpsc::channel::<NotifyEvent>(100);
        let mut watcher = PollWatcher::new(
            move |res: Result<NotifyEvent, notify::Error>| match res {
                Ok(event) => {
                    let _ = tx.try_send(event);
                }
                Err(err) => debug!(error = %err, "watch error"),
            },
            notify::Config::default().with_poll_interval(poll_interval),
        )
        .context("create poll watcher")?;

        let mut watched: Vec<PathBuf> = Vec::new();
        let mut pending_dirs = Vec::new();
        for file in targets.files() {
            let Some(parent) = file.parent() else {
                continue;
            };
            let dir = if parent.is_dir() {
                parent.to_path_buf()
            } else {
                pending_dirs.push(parent.to_path_buf());
                match parent.ancestors().find(|dir| dir.is_dir()) {
                    Some(ancestor) => ancestor.to_path_buf(),
                    None => continue,
                }
            };
            if watched.contains(&dir) {
                continue;
            }
            watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("watch {}", dir.display()))?;
            info!(path = %dir.display(), "watching directory");
            watched.push(dir);
        }

        Ok(Self {
            watcher,
            targets,
            pending_dirs,
            raw_rx,
            queued: VecDeque::new(),
        })
    }

    pub fn targets(&self) -> &WatchTargets {
        &self.targets
    }

    /// Wait for the next change to a backing source.
    ///
    /// Returns `None` once the underlying watcher has shut down.
    pub async fn next_change(&mut self) -> Option<SourceChange> {
        loop {
            if let Some(change) = self.queued.pop_front() {
                return Some(change);
            }
            let event = self.raw_rx.recv().await?;
            self.arm_created_dirs(&event);
            for change in self.targets.classify(&event) {
                debug!(?change, "backing source changed");
                self.queued.push_back(change);
            }
        }
    }

    /// Start watching parent directories that have just been created.
    fn arm_created_dirs(&mut self, event: &NotifyEvent) {
        if self.pending_dirs.is_empty() || !matches!(event.kind, EventKind::Create(_)) {
            return;
        }
        let created: Vec<PathBuf> = self
            .pending_dirs
            .iter()
            .filter(|dir| dir.is_dir())
            .cloned()
            .collect();
        for dir in created {
            self.pending_dirs.retain(|pending| pending != &dir);
            if let Err(err) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
                warn!(path = %dir.display(), error = %err, "failed to watch created directory");
                continue;
            }
            info!(path = %dir.display(), "watching created directory");
            for file in self.targets.files() {
                if file.parent() == Some(dir.as_path()) && file.exists() {
                    let change = if Some(file) == self.targets.project_file.as_deref() {
                        SourceChange::ProjectFile
                    } else {
                        SourceChange::UserSettings
                    };
                    self.queued.push_back(change);
                }
            }
        }
    }
}
