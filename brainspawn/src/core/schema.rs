//! Normalize untyped configuration data into the typed model.
//!
//! Error messages are shown to the user verbatim, so every failure names the
//! group, terminal index and field that caused it.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Value};

use crate::core::types::{
    BrainSpawnConfig, CONFIG_VERSION, GroupSource, SpawnGroup, TerminalColor, TerminalDefinition,
};

/// Validate raw data and build a [`BrainSpawnConfig`].
///
/// Blank names are replaced by positional defaults; malformed shapes, wrong
/// field types and unknown colors fail.
pub fn validate_config(raw: &Value) -> Result<BrainSpawnConfig> {
    let Value::Object(root) = raw else {
        bail!("Configuration must be an object");
    };

    let version = root
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(CONFIG_VERSION);

    let Some(Value::Array(raw_groups)) = root.get("groups") else {
        bail!("Configuration must have a \"groups\" array");
    };

    let groups = raw_groups
        .iter()
        .enumerate()
        .map(|(index, group)| validate_group(group, index))
        .collect::<Result<Vec<_>>>()?;

    Ok(BrainSpawnConfig { version, groups })
}

/// Validate a bare list of groups (the user-settings form).
pub fn validate_groups(raw: &[Value]) -> Result<Vec<SpawnGroup>> {
    raw.iter()
        .enumerate()
        .map(|(index, group)| validate_group(group, index))
        .collect()
}

/// Default label for an unnamed group at `index`.
pub fn default_group_name(index: usize) -> String {
    if index == 0 {
        "Untitled Group".to_string()
    } else {
        format!("Untitled Group {}", index + 1)
    }
}

/// Default label for an unnamed terminal at `index`.
pub fn default_terminal_name(index: usize) -> String {
    format!("Terminal {}", index + 1)
}

fn validate_group(raw: &Value, index: usize) -> Result<SpawnGroup> {
    let Value::Object(obj) = raw else {
        bail!("Group at index {index} must be an object");
    };

    let name = non_blank_name(obj).unwrap_or_else(|| default_group_name(index));

    let Some(Value::Array(raw_terminals)) = obj.get("terminals") else {
        bail!("Group \"{name}\" must have a \"terminals\" array");
    };

    let terminals = raw_terminals
        .iter()
        .enumerate()
        .map(|(ti, terminal)| validate_terminal(terminal, &name, ti))
        .collect::<Result<Vec<_>>>()?;

    let source = obj
        .get("source")
        .and_then(Value::as_str)
        .and_then(GroupSource::from_tag);

    Ok(SpawnGroup {
        name,
        terminals,
        source,
    })
}

fn validate_terminal(raw: &Value, group: &str, index: usize) -> Result<TerminalDefinition> {
    let Value::Object(obj) = raw else {
        bail!("Terminal at index {index} in group \"{group}\" must be an object");
    };

    let name = non_blank_name(obj).unwrap_or_else(|| default_terminal_name(index));
    let field = FieldReader {
        obj,
        terminal: &name,
        group,
        index,
    };

    let color = match field.string("color")? {
        Some(raw) => Some(TerminalColor::parse(&raw).ok_or_else(|| {
            field.error(&format!(
                "invalid color \"{raw}\". Valid: {}",
                TerminalColor::valid_list()
            ))
        })?),
        None => None,
    };

    Ok(TerminalDefinition {
        command: field.string("command")?,
        icon: field.string("icon")?,
        color,
        cwd: field.string("cwd")?,
        env: field.env()?,
        focus: field.boolean("focus")?,
        name,
    })
}

fn non_blank_name(obj: &Map<String, Value>) -> Option<String> {
    obj.get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

/// Typed access to optional terminal fields with located error messages.
struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    terminal: &'a str,
    group: &'a str,
    index: usize,
}

impl FieldReader<'_> {
    fn error(&self, detail: &str) -> anyhow::Error {
        anyhow!(
            "Terminal \"{}\" (index {}) in group \"{}\": {detail}",
            self.terminal,
            self.index,
            self.group
        )
    }

    fn present(&self, key: &str) -> Option<&Value> {
        self.obj.get(key).filter(|value| !value.is_null())
    }

    fn string(&self, key: &str) -> Result<Option<String>> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.error(&format!("\"{key}\" must be a string"))),
        }
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>> {
        match self.present(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.error(&format!("\"{key}\" must be a boolean"))),
        }
    }

    fn env(&self) -> Result<Option<BTreeMap<String, String>>> {
        let Some(raw) = self.present("env") else {
            return Ok(None);
        };
        let Value::Object(vars) = raw else {
            return Err(self.error("\"env\" must be an object"));
        };
        let mut env = BTreeMap::new();
        for (key, value) in vars {
            let Value::String(value) = value else {
                return Err(self.error(&format!("\"env.{key}\" must be a string")));
            };
            env.insert(key.clone(), value.clone());
        }
        Ok(Some(env))
    }
}
