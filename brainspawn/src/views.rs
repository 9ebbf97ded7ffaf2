//! Presentation adapters for the tree view and the status bar.

use serde::Serialize;

use crate::core::launch_plan::DEFAULT_ICON;
use crate::core::types::{BrainSpawnConfig, GroupKey, GroupSource, SpawnGroup};
use crate::terminals::registry::TerminalRegistry;

/// `"1 terminal"`, `"3 terminals"`.
pub fn terminal_count(count: usize) -> String {
    if count == 1 {
        "1 terminal".to_string()
    } else {
        format!("{count} terminals")
    }
}

/// `"Workspace · 2 terminals"`. Untagged groups read as workspace.
pub fn group_description(group: &SpawnGroup) -> String {
    let scope = group.source.unwrap_or(GroupSource::Workspace).label();
    format!("{scope} · {}", terminal_count(group.terminals.len()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalItem {
    pub label: String,
    /// The startup command, or empty.
    pub description: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupItem {
    pub key: GroupKey,
    pub label: String,
    pub description: String,
    pub running: bool,
    pub icon: &'static str,
    pub context_value: &'static str,
    pub children: Vec<TerminalItem>,
}

/// One item per configured group, in snapshot order.
pub fn tree_items(config: &BrainSpawnConfig, registry: &TerminalRegistry) -> Vec<GroupItem> {
    config
        .groups
        .iter()
        .map(|group| {
            let key = GroupKey::of(group);
            let running = registry.is_group_running(&key);
            GroupItem {
                label: group.name.clone(),
                description: group_description(group),
                running,
                icon: if running { "debug-start" } else { "symbol-folder" },
                context_value: if running {
                    "spawnGroupRunning"
                } else {
                    "spawnGroup"
                },
                children: group
                    .terminals
                    .iter()
                    .map(|def| TerminalItem {
                        label: def.name.clone(),
                        description: def.command.clone().unwrap_or_default(),
                        icon: def.icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_string()),
                        color_id: def.color.map(|color| color.theme_id().to_string()),
                    })
                    .collect(),
                key,
            }
        })
        .collect()
}

/// Status bar entry summarizing running terminals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBarState {
    pub text: &'static str,
    pub tooltip: String,
    /// Active terminal count; `None` when nothing runs.
    pub badge: Option<usize>,
    pub command: &'static str,
}

impl StatusBarState {
    pub fn from_registry(registry: &TerminalRegistry) -> Self {
        let count = registry.active_terminal_count();
        let tooltip = if count > 0 {
            format!(
                "Active: {} ({})",
                registry.running_group_names().join(", "),
                terminal_count(count)
            )
        } else {
            "Click to launch a spawn group".to_string()
        };
        Self {
            text: "Brain Spawn",
            tooltip,
            badge: (count > 0).then_some(count),
            command: "brainSpawn.launch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::launch_plan::TerminalOptions;
    use crate::core::types::{TerminalColor, TerminalDefinition};
    use crate::host::TerminalHost;
    use crate::test_support::{FakeTerminalHost, terminal, user_group, workspace_group};

    fn track(registry: &mut TerminalRegistry, host: &mut FakeTerminalHost, key: GroupKey) {
        let handle = host
            .create(TerminalOptions {
                name: "t".to_string(),
                icon_id: DEFAULT_ICON.to_string(),
                color_id: None,
                cwd: None,
                env: None,
            })
            .expect("create");
        registry.track(key, handle);
    }

    #[test]
    fn group_items_reflect_scope_and_running_state() {
        let web = TerminalDefinition {
            command: Some("npm start".to_string()),
            icon: Some("globe".to_string()),
            color: Some(TerminalColor::Cyan),
            ..terminal("web")
        };
        let config = BrainSpawnConfig {
            version: 1,
            groups: vec![
                workspace_group("dev", vec![web, terminal("shell")]),
                user_group("dev", vec![terminal("one")]),
            ],
        };
        let mut registry = TerminalRegistry::new();
        let mut host = FakeTerminalHost::default();
        track(&mut registry, &mut host, GroupKey::of(&config.groups[1]));

        let items = tree_items(&config, &registry);
        assert_eq!(items[0].description, "Workspace · 2 terminals");
        assert!(!items[0].running);
        assert_eq!(items[0].context_value, "spawnGroup");
        assert_eq!(items[1].description, "User · 1 terminal");
        assert!(items[1].running);
        assert_eq!(items[1].context_value, "spawnGroupRunning");
        assert_eq!(items[1].icon, "debug-start");

        let child = &items[0].children[0];
        assert_eq!(child.description, "npm start");
        assert_eq!(child.icon, "globe");
        assert_eq!(child.color_id.as_deref(), Some("terminal.ansiCyan"));
        assert_eq!(items[0].children[1].description, "");
        assert_eq!(items[0].children[1].icon, DEFAULT_ICON);
    }

    #[test]
    fn status_bar_summarizes_running_groups() {
        let mut registry = TerminalRegistry::new();
        let idle = StatusBarState::from_registry(&registry);
        assert_eq!(idle.tooltip, "Click to launch a spawn group");
        assert_eq!(idle.badge, None);

        let mut host = FakeTerminalHost::default();
        track(&mut registry, &mut host, GroupKey::new("a", Some(GroupSource::Workspace)));
        let single = StatusBarState::from_registry(&registry);
        assert_eq!(single.tooltip, "Active: a (1 terminal)");

        track(&mut registry, &mut host, GroupKey::new("b", Some(GroupSource::User)));
        track(&mut registry, &mut host, GroupKey::new("b", Some(GroupSource::User)));
        let busy = StatusBarState::from_registry(&registry);
        assert_eq!(busy.text, "Brain Spawn");
        assert_eq!(busy.tooltip, "Active: a, b (3 terminals)");
        assert_eq!(busy.badge, Some(3));
    }
}
