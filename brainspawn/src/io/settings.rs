//! User-scoped settings store.
//!
//! Settings are addressed by dotted keys (`brainSpawn.groups`). Each key can
//! have a global (per-user) value and a project-scoped value; group loading
//! only ever reads the global one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{debug, warn};

/// Setting holding user-scoped spawn groups.
pub const GROUPS_KEY: &str = "brainSpawn.groups";

/// Values of one setting in each scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingInspection {
    pub global_value: Option<Value>,
    pub workspace_value: Option<Value>,
}

/// Key-value settings with a writable global scope.
pub trait SettingsStore: Send {
    fn inspect(&self, key: &str) -> Result<SettingInspection>;

    /// Set (or with `None`, clear) the global value of `key`.
    fn update_global(&mut self, key: &str, value: Option<Value>) -> Result<()>;

    /// File backing the global scope, if any, so callers can watch it.
    fn global_path(&self) -> Option<&Path> {
        None
    }
}

/// Settings kept in TOML files: one per user, one optional per project.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    global_path: PathBuf,
    workspace_path: Option<PathBuf>,
}

impl TomlSettingsStore {
    pub fn new(global_path: impl Into<PathBuf>, workspace_path: Option<PathBuf>) -> Self {
        Self {
            global_path: global_path.into(),
            workspace_path,
        }
    }
}

impl SettingsStore for TomlSettingsStore {
    fn inspect(&self, key: &str) -> Result<SettingInspection> {
        let global_value = lookup(&read_table(&self.global_path)?, key)?;
        // A broken project override never hides the global value.
        let workspace_value = match &self.workspace_path {
            Some(path) => read_table(path)
                .and_then(|table| lookup(&table, key))
                .unwrap_or_else(|err| {
                    warn!(
                        path = %path.display(),
                        error = %format!("{err:#}"),
                        "ignoring unreadable project settings"
                    );
                    None
                }),
            None => None,
        };
        Ok(SettingInspection {
            global_value,
            workspace_value,
        })
    }

    fn update_global(&mut self, key: &str, value: Option<Value>) -> Result<()> {
        debug!(path = %self.global_path.display(), key, clear = value.is_none(), "updating setting");
        let mut table = read_table(&self.global_path)?;
        let (parents, leaf) = split_key(key)?;

        let mut current = &mut table;
        for part in parents {
            let entry = current
                .entry(part.to_string())
                .or_insert(toml::Value::Table(toml::Table::new()));
            current = entry
                .as_table_mut()
                .ok_or_else(|| anyhow!("setting \"{part}\" in {key} is not a table"))?;
        }

        match value {
            Some(value) => {
                let value = toml::Value::try_from(value)
                    .with_context(|| format!("convert {key} to toml"))?;
                current.insert(leaf.to_string(), value);
            }
            None => {
                current.remove(leaf);
            }
        }

        let mut buf = toml::to_string_pretty(&table).context("serialize settings toml")?;
        if !buf.ends_with('\n') {
            buf.push('\n');
        }
        write_atomic(&self.global_path, &buf)
    }

    fn global_path(&self) -> Option<&Path> {
        Some(self.global_path.as_path())
    }
}

fn split_key(key: &str) -> Result<(Vec<&str>, &str)> {
    let mut parts: Vec<&str> = key.split('.').collect();
    let leaf = parts
        .pop()
        .filter(|leaf| !leaf.is_empty())
        .ok_or_else(|| anyhow!("empty setting key"))?;
    Ok((parts, leaf))
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(toml::Table::new()),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

fn lookup(table: &toml::Table, key: &str) -> Result<Option<Value>> {
    let (parents, leaf) = split_key(key)?;
    let mut current = table;
    for part in parents {
        match current.get(part).and_then(toml::Value::as_table) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    current
        .get(leaf)
        .map(|value| serde_json::to_value(value).with_context(|| format!("convert {key} to json")))
        .transpose()
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("settings path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp settings {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace settings {}", path.display()))?;
    Ok(())
}
