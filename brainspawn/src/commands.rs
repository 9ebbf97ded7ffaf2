//! User commands and the controller that owns the runtime state.

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::core::substitution::SubstitutionContext;
use crate::core::types::{GroupKey, GroupSource, SpawnGroup};
use crate::editor::panel::{PanelAction, PanelGuard};
use crate::editor::protocol::{EditorMessage, EditorRequest, handle_request};
use crate::host::{EditorHost, PickItem, Prompter, TerminalHost, TerminalId};
use crate::store::ConfigStore;
use crate::terminals::launcher::{LaunchOutcome, launch_group, launch_single_terminal};
use crate::terminals::registry::TerminalRegistry;
use crate::views::{GroupItem, StatusBarState, group_description, terminal_count, tree_items};

pub const EDIT_CONFIGURATION: &str = "Edit Configuration";

/// Commands exposed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Launch the only group, or pick one when there are several.
    Launch,
    LaunchGroup {
        name: String,
        source: Option<GroupSource>,
    },
    /// Pick a running group and kill it.
    KillGroup,
    KillGroupByKey(GroupKey),
    EditConfiguration,
    /// Launch one terminal (by index) of a group.
    LaunchTerminal { key: GroupKey, terminal: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Launched { key: GroupKey, outcome: LaunchOutcome },
    TerminalLaunched { key: GroupKey, id: TerminalId },
    Killed(GroupKey),
    Editor(PanelAction),
    /// Nothing to do, or the user dismissed a prompt.
    Dismissed,
}

/// Owns the store, the running terminals and the editor panel.
pub struct Workbench {
    store: ConfigStore,
    registry: TerminalRegistry,
    panel: PanelGuard,
    ctx: SubstitutionContext,
    host: Box<dyn TerminalHost>,
    prompter: Box<dyn Prompter>,
    editor: Box<dyn EditorHost>,
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("store", &self.store)
            .field("registry", &self.registry)
            .field("panel", &self.panel)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

impl Workbench {
    /// Build a workbench around `store`, loading it if needed.
    pub fn new(
        mut store: ConfigStore,
        host: Box<dyn TerminalHost>,
        prompter: Box<dyn Prompter>,
        editor: Box<dyn EditorHost>,
    ) -> Self {
        if !store.is_loaded() {
            store.load();
        }
        let ctx = SubstitutionContext::from_process(store.project_root());
        Self {
            store,
            registry: TerminalRegistry::new(),
            panel: PanelGuard::default(),
            ctx,
            host,
            prompter,
            editor,
        }
    }

    /// Replace the substitution context captured at construction.
    pub fn with_substitution(mut self, ctx: SubstitutionContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    pub fn registry(&self) -> &TerminalRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TerminalRegistry {
        &mut self.registry
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        info!(?command, "executing command");
        match command {
            Command::Launch => self.launch(),
            Command::LaunchGroup { name, source } => {
                let config = self.store.config();
                let group = config
                    .find_group(&name, source)
                    .ok_or_else(|| anyhow!("Spawn group \"{name}\" not found"))?;
                self.launch_group(group)
            }
            Command::KillGroup => self.pick_and_kill(),
            Command::KillGroupByKey(key) => {
                self.registry.kill_group(&key);
                Ok(CommandOutcome::Killed(key))
            }
            Command::EditConfiguration => Ok(self.edit_configuration()),
            Command::LaunchTerminal { key, terminal } => {
                let config = self.store.config();
                let def = config
                    .find_group(&key.name, key.source)
                    .and_then(|group| group.terminals.get(terminal))
                    .with_context(|| format!("no terminal {terminal} in group {key}"))?;
                let id = launch_single_terminal(
                    def,
                    &key,
                    &self.ctx,
                    &mut self.registry,
                    self.host.as_mut(),
                )?;
                Ok(CommandOutcome::TerminalLaunched { key, id })
            }
        }
    }

    /// Answer a message from the editor panel.
    pub fn handle_editor_request(&mut self, request: EditorRequest) -> Vec<EditorMessage> {
        handle_request(request, &mut self.store, self.prompter.as_ref())
    }

    /// The host disposed the editor panel.
    pub fn editor_closed(&mut self) {
        self.panel.close(&mut self.store);
    }

    /// The host reported a terminal as closed.
    pub fn terminal_closed(&mut self, id: TerminalId) {
        self.registry.handle_closed(id);
    }

    pub fn tree_items(&self) -> Vec<GroupItem> {
        tree_items(&self.store.config(), &self.registry)
    }

    pub fn status_bar(&self) -> StatusBarState {
        StatusBarState::from_registry(&self.registry)
    }

    fn launch(&mut self) -> Result<CommandOutcome> {
        let config = self.store.config();
        match config.groups.as_slice() {
            [] => {
                let action = self
                    .prompter
                    .inform("No spawn groups configured.", &[EDIT_CONFIGURATION]);
                if action.as_deref() == Some(EDIT_CONFIGURATION) {
                    return Ok(self.edit_configuration());
                }
                Ok(CommandOutcome::Dismissed)
            }
            [group] => self.launch_group(group),
            groups => {
                let items: Vec<PickItem> = groups
                    .iter()
                    .map(|group| PickItem {
                        label: group.name.clone(),
                        description: group_description(group),
                    })
                    .collect();
                let picked = self
                    .prompter
                    .pick("Select a spawn group to launch", &items)
                    .and_then(|index| groups.get(index));
                match picked {
                    Some(group) => self.launch_group(group),
                    None => Ok(CommandOutcome::Dismissed),
                }
            }
        }
    }

    fn launch_group(&mut self, group: &SpawnGroup) -> Result<CommandOutcome> {
        let outcome = launch_group(
            group,
            &self.ctx,
            &mut self.registry,
            self.host.as_mut(),
            self.prompter.as_ref(),
        )?;
        Ok(CommandOutcome::Launched {
            key: GroupKey::of(group),
            outcome,
        })
    }

    fn pick_and_kill(&mut self) -> Result<CommandOutcome> {
        let running = self.registry.running_groups();
        if running.is_empty() {
            self.prompter
                .inform("No Brain Spawn terminal groups are running.", &[]);
            return Ok(CommandOutcome::Dismissed);
        }
        let items: Vec<PickItem> = running
            .iter()
            .map(|(key, count)| PickItem {
                label: key.name.clone(),
                description: format!("{count} terminal(s)"),
            })
            .collect();
        let Some((key, count)) = self
            .prompter
            .pick("Select a group to kill", &items)
            .and_then(|index| running.get(index))
        else {
            return Ok(CommandOutcome::Dismissed);
        };
        info!(group = %key, terminals = %terminal_count(*count), "killing picked group");
        self.registry.kill_group(key);
        Ok(CommandOutcome::Killed(key.clone()))
    }

    fn edit_configuration(&mut self) -> CommandOutcome {
        CommandOutcome::Editor(
            self.panel
                .open_or_reveal(&mut self.store, self.editor.as_mut()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::host::CollectingNotifier;
    use crate::io::settings::GROUPS_KEY;
    use crate::test_support::{
        Answer, FakeTerminalHost, MemorySettingsStore, RecordingEditor, ScriptedPrompter,
    };

    struct Harness {
        bench: Workbench,
        host: FakeTerminalHost,
        editor: RecordingEditor,
    }

    fn harness(groups: serde_json::Value, answers: Vec<Answer>) -> Harness {
        let settings = MemorySettingsStore::default();
        settings.set_global(GROUPS_KEY, groups);
        let store = ConfigStore::new(
            None,
            Box::new(settings),
            Arc::new(CollectingNotifier::default()),
        );
        let host = FakeTerminalHost::default();
        let editor = RecordingEditor::default();
        let bench = Workbench::new(
            store,
            Box::new(host.clone()),
            Box::new(ScriptedPrompter::new(answers)),
            Box::new(editor.clone()),
        )
        .with_substitution(SubstitutionContext::default());
        Harness {
            bench,
            host,
            editor,
        }
    }

    fn two_groups() -> serde_json::Value {
        json!([
            { "name": "api", "terminals": [{ "name": "server" }] },
            { "name": "web", "terminals": [{ "name": "vite" }, { "name": "tests" }] }
        ])
    }

    #[test]
    fn launch_without_groups_offers_editor() {
        let mut h = harness(json!([]), vec![Answer::Button(EDIT_CONFIGURATION.to_string())]);
        let outcome = h.bench.execute(Command::Launch).expect("launch");
        assert_eq!(outcome, CommandOutcome::Editor(PanelAction::Opened));
        assert_eq!(h.editor.opened(), 1);

        let outcome = h.bench.execute(Command::Launch).expect("launch again");
        assert_eq!(outcome, CommandOutcome::Dismissed);
    }

    #[test]
    fn launch_with_single_group_skips_picker() {
        let mut h = harness(json!([{ "name": "only", "terminals": [{ "name": "t" }] }]), vec![]);
        let outcome = h.bench.execute(Command::Launch).expect("launch");
        let CommandOutcome::Launched { key, .. } = outcome else {
            panic!("expected launch, got {outcome:?}");
        };
        assert_eq!(key, GroupKey::new("only", Some(GroupSource::User)));
        assert_eq!(h.host.created().len(), 1);
    }

    #[test]
    fn launch_with_several_groups_uses_picked_one() {
        let mut h = harness(two_groups(), vec![Answer::Pick(1)]);
        h.bench.execute(Command::Launch).expect("launch");
        let created: Vec<String> = h.host.created().into_iter().map(|(_, name)| name).collect();
        assert_eq!(created, vec!["vite", "tests"]);
        assert_eq!(h.bench.status_bar().tooltip, "Active: web (2 terminals)");
    }

    #[test]
    fn kill_group_picks_among_running_groups() {
        let mut h = harness(two_groups(), vec![Answer::Dismiss, Answer::Pick(0)]);
        let outcome = h.bench.execute(Command::KillGroup).expect("kill");
        assert_eq!(outcome, CommandOutcome::Dismissed, "nothing running");

        h.bench
            .execute(Command::LaunchGroup {
                name: "web".to_string(),
                source: None,
            })
            .expect("launch");
        let outcome = h.bench.execute(Command::KillGroup).expect("kill");
        assert_eq!(
            outcome,
            CommandOutcome::Killed(GroupKey::new("web", Some(GroupSource::User)))
        );
        assert_eq!(h.host.disposed(), vec![1, 2]);
        assert_eq!(h.bench.registry().active_terminal_count(), 0);
    }

    #[test]
    fn out_of_range_picks_are_dismissals() {
        let mut h = harness(two_groups(), vec![Answer::Pick(7)]);
        let outcome = h.bench.execute(Command::Launch).expect("launch");
        assert_eq!(outcome, CommandOutcome::Dismissed);
        assert!(h.host.created().is_empty());

        let mut h = harness(two_groups(), vec![Answer::Pick(3)]);
        h.bench
            .execute(Command::LaunchGroup {
                name: "api".to_string(),
                source: None,
            })
            .expect("launch");
        let outcome = h.bench.execute(Command::KillGroup).expect("kill");
        assert_eq!(outcome, CommandOutcome::Dismissed);
        assert!(h.host.disposed().is_empty());
        assert_eq!(h.bench.registry().active_terminal_count(), 1);
    }

    #[test]
    fn launch_terminal_and_closure_update_tree() {
        let mut h = harness(two_groups(), vec![]);
        let key = GroupKey::new("web", Some(GroupSource::User));
        let outcome = h
            .bench
            .execute(Command::LaunchTerminal {
                key: key.clone(),
                terminal: 1,
            })
            .expect("launch terminal");
        assert_eq!(
            outcome,
            CommandOutcome::TerminalLaunched {
                key: key.clone(),
                id: 1
            }
        );
        assert!(h.bench.tree_items()[1].running);

        h.bench.terminal_closed(1);
        assert!(!h.bench.tree_items()[1].running);

        let err = h
            .bench
            .execute(Command::LaunchTerminal { key, terminal: 5 })
            .expect_err("missing terminal");
        assert!(err.to_string().contains("no terminal 5"));
    }

    #[test]
    fn unknown_group_is_an_error() {
        let mut h = harness(two_groups(), vec![]);
        let err = h
            .bench
            .execute(Command::LaunchGroup {
                name: "nope".to_string(),
                source: None,
            })
            .expect_err("missing");
        assert_eq!(err.to_string(), "Spawn group \"nope\" not found");
    }

    #[test]
    fn editor_panel_is_single_and_receives_saves() {
        let mut h = harness(two_groups(), vec![]);
        h.bench.execute(Command::EditConfiguration).expect("open");
        assert_eq!(
            h.bench.execute(Command::EditConfiguration).expect("reveal"),
            CommandOutcome::Editor(PanelAction::Revealed)
        );

        let replies = h.bench.handle_editor_request(EditorRequest::SaveConfig {
            config: json!({ "groups": [{ "name": "solo", "terminals": [], "source": "user" }] }),
        });
        assert!(replies.is_empty());
        let pushed = h.editor.messages();
        assert_eq!(pushed.len(), 1);
        let EditorMessage::Config { config } = &pushed[0] else {
            panic!("expected config push");
        };
        assert_eq!(config.groups[0].name, "solo");

        h.bench.editor_closed();
        assert_eq!(
            h.bench.execute(Command::EditConfiguration).expect("reopen"),
            CommandOutcome::Editor(PanelAction::Opened)
        );
    }
}
