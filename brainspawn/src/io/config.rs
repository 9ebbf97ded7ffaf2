//! Tool configuration stored under `<config dir>/brain-spawn/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Tool configuration (TOML).
///
/// Missing fields default to sensible values; a missing file is the same as
/// an empty one.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    /// How often the file watcher polls the backing sources.
    pub poll_interval_ms: u64,

    /// Window after a save during which watch-triggered pushes to the
    /// editor are dropped.
    pub echo_window_ms: u64,

    /// Override for the user settings file location.
    pub settings_path: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            echo_window_ms: 1000,
            settings_path: None,
        }
    }
}

impl ToolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms must be > 0"));
        }
        if self.echo_window_ms == 0 {
            return Err(anyhow!("echo_window_ms must be > 0"));
        }
        if let Some(path) = &self.settings_path
            && path.as_os_str().is_empty()
        {
            return Err(anyhow!("settings_path must not be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ToolConfig::default()`.
pub fn load_config(path: &Path) -> Result<ToolConfig> {
    if !path.exists() {
        let cfg = ToolConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ToolConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
