//! Configuration model shared by every component.
//!
//! These types are only built by [`crate::core::schema::validate_config`], so a
//! value of any of them has already passed validation. They serialize to the
//! same JSON shape the backing sources use.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::Serialize;

/// Version tag written to the project file.
pub const CONFIG_VERSION: u32 = 1;

/// Which backing source a group was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupSource {
    /// Project-scoped file under the project root.
    Workspace,
    /// User-scoped settings, global scope.
    User,
}

impl GroupSource {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupSource::Workspace => "workspace",
            GroupSource::User => "user",
        }
    }

    /// Human-facing scope label used in pickers and tree descriptions.
    pub fn label(self) -> &'static str {
        match self {
            GroupSource::Workspace => "Workspace",
            GroupSource::User => "User",
        }
    }

    /// Parse a raw tag; anything other than the two known tags yields `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "workspace" => Some(GroupSource::Workspace),
            "user" => Some(GroupSource::User),
            _ => None,
        }
    }
}

impl fmt::Display for GroupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        GroupSource::from_tag(s)
            .ok_or_else(|| anyhow!("unknown source \"{s}\" (expected workspace or user)"))
    }
}

/// Terminal tab color. Parsed case-insensitively, stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl TerminalColor {
    pub const ALL: [TerminalColor; 8] = [
        TerminalColor::Black,
        TerminalColor::Red,
        TerminalColor::Green,
        TerminalColor::Yellow,
        TerminalColor::Blue,
        TerminalColor::Magenta,
        TerminalColor::Cyan,
        TerminalColor::White,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TerminalColor::Black => "black",
            TerminalColor::Red => "red",
            TerminalColor::Green => "green",
            TerminalColor::Yellow => "yellow",
            TerminalColor::Blue => "blue",
            TerminalColor::Magenta => "magenta",
            TerminalColor::Cyan => "cyan",
            TerminalColor::White => "white",
        }
    }

    /// Host theme color id, e.g. `terminal.ansiRed`.
    pub fn theme_id(self) -> &'static str {
        match self {
            TerminalColor::Black => "terminal.ansiBlack",
            TerminalColor::Red => "terminal.ansiRed",
            TerminalColor::Green => "terminal.ansiGreen",
            TerminalColor::Yellow => "terminal.ansiYellow",
            TerminalColor::Blue => "terminal.ansiBlue",
            TerminalColor::Magenta => "terminal.ansiMagenta",
            TerminalColor::Cyan => "terminal.ansiCyan",
            TerminalColor::White => "terminal.ansiWhite",
        }
    }

    /// Comma-separated list of accepted values, for error messages.
    pub fn valid_list() -> String {
        TerminalColor::ALL
            .iter()
            .map(|color| color.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case-insensitive lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.to_lowercase();
        TerminalColor::ALL
            .into_iter()
            .find(|color| color.as_str() == lowered)
    }
}

impl fmt::Display for TerminalColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of one terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<TerminalColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<bool>,
}

impl TerminalDefinition {
    /// A terminal with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: None,
            icon: None,
            color: None,
            cwd: None,
            env: None,
            focus: None,
        }
    }

    pub fn wants_focus(&self) -> bool {
        self.focus == Some(true)
    }
}

/// A named, ordered set of terminals launched and killed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnGroup {
    pub name: String,
    pub terminals: Vec<TerminalDefinition>,
    /// Set on every group of the merged snapshot; never written to a backing source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<GroupSource>,
}

impl SpawnGroup {
    /// Copy of the group suitable for persistence (no `source` tag).
    pub fn without_source(&self) -> SpawnGroup {
        SpawnGroup {
            source: None,
            ..self.clone()
        }
    }

    pub fn with_source(mut self, source: GroupSource) -> SpawnGroup {
        self.source = Some(source);
        self
    }
}

/// Merged configuration: workspace groups first, then user groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrainSpawnConfig {
    pub version: u32,
    pub groups: Vec<SpawnGroup>,
}

impl Default for BrainSpawnConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            groups: Vec::new(),
        }
    }
}

impl BrainSpawnConfig {
    /// Find a group by name and source.
    pub fn find_group(&self, name: &str, source: Option<GroupSource>) -> Option<&SpawnGroup> {
        self.groups
            .iter()
            .find(|group| group.name == name && (source.is_none() || group.source == source))
    }

    /// Groups tagged with `source`, in snapshot order.
    pub fn groups_from(&self, source: GroupSource) -> impl Iterator<Item = &SpawnGroup> {
        self.groups
            .iter()
            .filter(move |group| group.source == Some(source))
    }
}

/// Identity of a group for running-terminal bookkeeping.
///
/// Two groups with the same name in different scopes are distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub name: String,
    pub source: Option<GroupSource>,
}

impl GroupKey {
    pub fn new(name: impl Into<String>, source: Option<GroupSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn of(group: &SpawnGroup) -> Self {
        Self::new(group.name.clone(), group.source)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(source) => write!(f, "{} ({})", self.name, source),
            None => f.write_str(&self.name),
        }
    }
}
