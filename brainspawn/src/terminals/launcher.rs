//! Launch spawn groups and single terminals through the host.

use anyhow::{Context, Result};
use tracing::info;

use crate::core::launch_plan::{focus_index, startup_command, terminal_options};
use crate::core::substitution::SubstitutionContext;
use crate::core::types::{GroupKey, SpawnGroup, TerminalDefinition};
use crate::host::{Prompter, TerminalHost, TerminalId};
use crate::terminals::registry::TerminalRegistry;

pub const KILL_AND_RELAUNCH: &str = "Kill & Relaunch";
pub const CANCEL: &str = "Cancel";

/// Result of [`launch_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Every terminal was created; `focused` is the one brought forward.
    Launched {
        terminals: Vec<TerminalId>,
        focused: Option<TerminalId>,
    },
    /// The group was already running and the user did not confirm a relaunch.
    Cancelled,
}

/// Create every terminal of `group`, in order, and foreground one of them.
///
/// A running group is only relaunched after the user picks
/// [`KILL_AND_RELAUNCH`]; the old sessions are disposed first.
pub fn launch_group(
    group: &SpawnGroup,
    ctx: &SubstitutionContext,
    registry: &mut TerminalRegistry,
    host: &mut dyn TerminalHost,
    prompter: &dyn Prompter,
) -> Result<LaunchOutcome> {
    let key = GroupKey::of(group);
    if registry.is_group_running(&key) {
        let message = format!(
            "Group \"{}\" is already running. Kill and relaunch?",
            group.name
        );
        let choice = prompter.confirm(&message, &[KILL_AND_RELAUNCH, CANCEL]);
        if choice.as_deref() != Some(KILL_AND_RELAUNCH) {
            info!(group = %key, "relaunch cancelled");
            return Ok(LaunchOutcome::Cancelled);
        }
        registry.kill_group(&key);
    }

    let mut terminals = Vec::with_capacity(group.terminals.len());
    for def in &group.terminals {
        terminals.push(open_terminal(def, &key, ctx, registry, host)?);
    }

    let focused = focus_index(&group.terminals).map(|index| terminals[index]);
    if let Some(id) = focused {
        registry.show(id);
    }
    info!(group = %key, count = terminals.len(), "launched group");
    Ok(LaunchOutcome::Launched { terminals, focused })
}

/// Create, track and show one terminal of a group.
pub fn launch_single_terminal(
    def: &TerminalDefinition,
    key: &GroupKey,
    ctx: &SubstitutionContext,
    registry: &mut TerminalRegistry,
    host: &mut dyn TerminalHost,
) -> Result<TerminalId> {
    let id = open_terminal(def, key, ctx, registry, host)?;
    registry.show(id);
    Ok(id)
}

fn open_terminal(
    def: &TerminalDefinition,
    key: &GroupKey,
    ctx: &SubstitutionContext,
    registry: &mut TerminalRegistry,
    host: &mut dyn TerminalHost,
) -> Result<TerminalId> {
    let handle = host
        .create(terminal_options(def, ctx))
        .with_context(|| format!("create terminal \"{}\" of group \"{}\"", def.name, key.name))?;
    let id = handle.id();
    if let Some(command) = startup_command(def, ctx) {
        handle.send_text(&command);
    }
    registry.track(key.clone(), handle);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::types::GroupSource;
    use crate::test_support::{
        Answer, FakeTerminalHost, HostCall, ScriptedPrompter, focused_terminal, terminal,
        workspace_group,
    };

    fn with_command(name: &str, command: &str) -> TerminalDefinition {
        TerminalDefinition {
            command: Some(command.to_string()),
            ..terminal(name)
        }
    }

    #[test]
    fn launch_creates_in_order_and_shows_last_without_focus_flag() {
        let group = workspace_group(
            "dev",
            vec![with_command("web", "npm start"), terminal("shell")],
        );
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();

        let outcome = launch_group(
            &group,
            &SubstitutionContext::default(),
            &mut registry,
            &mut host,
            &ScriptedPrompter::default(),
        )
        .expect("launch");

        assert_eq!(
            outcome,
            LaunchOutcome::Launched {
                terminals: vec![1, 2],
                focused: Some(2),
            }
        );
        assert_eq!(
            host.created(),
            vec![(1, "web".to_string()), (2, "shell".to_string())]
        );
        assert!(host.calls().contains(&HostCall::SendText {
            id: 1,
            text: "npm start".to_string(),
        }));
        assert_eq!(host.shown(), vec![2]);
        assert!(registry.is_group_running(&GroupKey::of(&group)));
    }

    #[test]
    fn first_flagged_terminal_is_the_only_one_shown() {
        let group = workspace_group(
            "dev",
            vec![terminal("a"), focused_terminal("b"), focused_terminal("c")],
        );
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();

        launch_group(
            &group,
            &SubstitutionContext::default(),
            &mut registry,
            &mut host,
            &ScriptedPrompter::default(),
        )
        .expect("launch");
        assert_eq!(host.shown(), vec![2]);
    }

    #[test]
    fn running_group_is_left_alone_unless_relaunch_confirmed() {
        let group = workspace_group("dev", vec![terminal("a")]);
        let ctx = SubstitutionContext::default();
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        launch_group(&group, &ctx, &mut registry, &mut host, &ScriptedPrompter::default())
            .expect("first launch");

        let prompter = ScriptedPrompter::new([Answer::Button(CANCEL.to_string())]);
        let outcome =
            launch_group(&group, &ctx, &mut registry, &mut host, &prompter).expect("cancel");
        assert_eq!(outcome, LaunchOutcome::Cancelled);
        assert_eq!(
            prompter.asked(),
            vec!["Group \"dev\" is already running. Kill and relaunch?"]
        );
        assert_eq!(host.created().len(), 1);
        assert!(host.disposed().is_empty());

        let dismissed = ScriptedPrompter::default();
        let outcome =
            launch_group(&group, &ctx, &mut registry, &mut host, &dismissed).expect("dismiss");
        assert_eq!(outcome, LaunchOutcome::Cancelled);

        let confirm = ScriptedPrompter::new([Answer::Button(KILL_AND_RELAUNCH.to_string())]);
        launch_group(&group, &ctx, &mut registry, &mut host, &confirm).expect("relaunch");
        assert_eq!(host.disposed(), vec![1]);
        assert_eq!(registry.group_terminals(&GroupKey::of(&group)), vec![2]);
    }

    #[test]
    fn commands_are_substituted_and_empty_ones_skipped() {
        let group = workspace_group(
            "dev",
            vec![
                with_command("a", "cd ${workspaceFolder}"),
                with_command("b", ""),
            ],
        );
        let ctx = SubstitutionContext::new(Some(PathBuf::from("/work/app")), Default::default());
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        launch_group(&group, &ctx, &mut registry, &mut host, &ScriptedPrompter::default())
            .expect("launch");

        let sent: Vec<HostCall> = host
            .calls()
            .into_iter()
            .filter(|call| matches!(call, HostCall::SendText { .. }))
            .collect();
        assert_eq!(
            sent,
            vec![HostCall::SendText {
                id: 1,
                text: "cd /work/app".to_string(),
            }]
        );
    }

    #[test]
    fn empty_group_launches_nothing() {
        let group = workspace_group("empty", Vec::new());
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        let outcome = launch_group(
            &group,
            &SubstitutionContext::default(),
            &mut registry,
            &mut host,
            &ScriptedPrompter::default(),
        )
        .expect("launch");
        assert_eq!(
            outcome,
            LaunchOutcome::Launched {
                terminals: Vec::new(),
                focused: None,
            }
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn single_terminal_joins_its_group_and_is_shown() {
        let key = GroupKey::new("dev", Some(GroupSource::User));
        let mut host = FakeTerminalHost::default();
        let mut registry = TerminalRegistry::new();
        let id = launch_single_terminal(
            &with_command("web", "npm start"),
            &key,
            &SubstitutionContext::default(),
            &mut registry,
            &mut host,
        )
        .expect("launch");

        assert_eq!(registry.group_terminals(&key), vec![id]);
        assert_eq!(host.shown(), vec![id]);
    }
}
