//! Editable working copy of the configuration.
//!
//! The editor mutates a draft through [`EditAction`]s and turns it into a
//! save request explicitly; incoming snapshots replace the draft wholesale.

use anyhow::{Context, Result, bail};

use crate::core::types::{BrainSpawnConfig, GroupSource, SpawnGroup, TerminalDefinition};
use crate::editor::protocol::EditorRequest;

const NEW_GROUP: &str = "New Group";
const NEW_TERMINAL: &str = "New Terminal";

/// One edit applied to an [`EditorDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    AddGroup { source: GroupSource },
    SelectGroup { group: usize },
    RenameGroup { group: usize, name: String },
    DeleteGroup { group: usize },
    /// Insert a copy right after the original and select it.
    DuplicateGroup { group: usize },
    /// Flip the group between workspace and user scope.
    ToggleScope { group: usize },
    AddTerminal { group: usize },
    UpdateTerminal {
        group: usize,
        index: usize,
        terminal: TerminalDefinition,
    },
    RemoveTerminal { group: usize, index: usize },
    /// Insert a copy right after the original terminal.
    DuplicateTerminal { group: usize, index: usize },
    MoveTerminal { group: usize, from: usize, to: usize },
    /// Setting focus clears it on every sibling.
    SetFocus {
        group: usize,
        index: usize,
        focus: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorDraft {
    config: BrainSpawnConfig,
    selected: Option<usize>,
}

impl EditorDraft {
    pub fn new(config: BrainSpawnConfig) -> Self {
        let selected = if config.groups.is_empty() { None } else { Some(0) };
        Self { config, selected }
    }

    pub fn config(&self) -> &BrainSpawnConfig {
        &self.config
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Replace the draft with a pushed snapshot, keeping the selection in range.
    pub fn receive(&mut self, config: BrainSpawnConfig) {
        self.config = config;
        self.clamp_selection();
    }

    pub fn apply(&mut self, action: EditAction) -> Result<()> {
        match action {
            EditAction::AddGroup { source } => {
                let name = self.unique_group_name();
                self.config.groups.push(SpawnGroup {
                    name,
                    terminals: Vec::new(),
                    source: Some(source),
                });
                self.selected = Some(self.config.groups.len() - 1);
            }
            EditAction::SelectGroup { group } => {
                self.group_mut(group)?;
                self.selected = Some(group);
            }
            EditAction::RenameGroup { group, name } => {
                self.group_mut(group)?.name = name;
            }
            EditAction::DeleteGroup { group } => {
                self.group_mut(group)?;
                self.config.groups.remove(group);
                self.clamp_selection();
            }
            EditAction::DuplicateGroup { group } => {
                let mut copy = self.group_mut(group)?.clone();
                copy.name = format!("{} (Copy)", copy.name);
                self.config.groups.insert(group + 1, copy);
                self.selected = Some(group + 1);
            }
            EditAction::ToggleScope { group } => {
                let group = self.group_mut(group)?;
                group.source = Some(match group.source {
                    Some(GroupSource::User) => GroupSource::Workspace,
                    _ => GroupSource::User,
                });
            }
            EditAction::AddTerminal { group } => {
                self.group_mut(group)?
                    .terminals
                    .push(TerminalDefinition::named(NEW_TERMINAL));
            }
            EditAction::UpdateTerminal {
                group,
                index,
                terminal,
            } => {
                *self.terminal_mut(group, index)? = terminal;
            }
            EditAction::RemoveTerminal { group, index } => {
                self.terminal_mut(group, index)?;
                self.group_mut(group)?.terminals.remove(index);
            }
            EditAction::DuplicateTerminal { group, index } => {
                let mut copy = self.terminal_mut(group, index)?.clone();
                copy.name = format!("{} (Copy)", copy.name);
                copy.focus = None;
                self.group_mut(group)?.terminals.insert(index + 1, copy);
            }
            EditAction::MoveTerminal { group, from, to } => {
                let terminals = &mut self.group_mut(group)?.terminals;
                if from >= terminals.len() || to >= terminals.len() {
                    bail!("terminal move {from} -> {to} out of range");
                }
                let moved = terminals.remove(from);
                terminals.insert(to, moved);
            }
            EditAction::SetFocus {
                group,
                index,
                focus,
            } => {
                self.terminal_mut(group, index)?;
                let terminals = &mut self.group_mut(group)?.terminals;
                if focus {
                    for (i, terminal) in terminals.iter_mut().enumerate() {
                        terminal.focus = (i == index).then_some(true);
                    }
                } else {
                    terminals[index].focus = None;
                }
            }
        }
        Ok(())
    }

    /// Save request carrying the whole draft, `source` tags included.
    pub fn save_request(&self) -> Result<EditorRequest> {
        let config = serde_json::to_value(&self.config).context("serialize draft")?;
        Ok(EditorRequest::SaveConfig { config })
    }

    fn unique_group_name(&self) -> String {
        let taken = |name: &str| self.config.groups.iter().any(|group| group.name == name);
        let mut name = NEW_GROUP.to_string();
        let mut n = 1;
        while taken(&name) {
            n += 1;
            name = format!("{NEW_GROUP} {n}");
        }
        name
    }

    fn clamp_selection(&mut self) {
        self.selected = match (self.selected, self.config.groups.len()) {
            (_, 0) => None,
            (None, _) => None,
            (Some(selected), len) => Some(selected.min(len - 1)),
        };
    }

    fn group_mut(&mut self, group: usize) -> Result<&mut SpawnGroup> {
        self.config
            .groups
            .get_mut(group)
            .with_context(|| format!("no group at index {group}"))
    }

    fn terminal_mut(&mut self, group: usize, index: usize) -> Result<&mut TerminalDefinition> {
        self.group_mut(group)?
            .terminals
            .get_mut(index)
            .with_context(|| format!("no terminal at index {index} in group {group}"))
    }
}
