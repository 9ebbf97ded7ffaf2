//! Resolve terminal definitions into host creation options.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::substitution::{SubstitutionContext, substitute};
use crate::core::types::TerminalDefinition;

/// Icon used when a terminal does not name one.
pub const DEFAULT_ICON: &str = "terminal";

/// Options passed to the host when creating a terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalOptions {
    pub name: String,
    pub icon_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

/// Build creation options with `cwd` and `env` values expanded.
pub fn terminal_options(def: &TerminalDefinition, ctx: &SubstitutionContext) -> TerminalOptions {
    TerminalOptions {
        name: def.name.clone(),
        icon_id: def.icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_string()),
        color_id: def.color.map(|color| color.theme_id().to_string()),
        cwd: def
            .cwd
            .as_deref()
            .filter(|cwd| !cwd.is_empty())
            .map(|cwd| substitute(cwd, ctx)),
        env: def.env.as_ref().map(|env| {
            env.iter()
                .map(|(key, value)| (key.clone(), substitute(value, ctx)))
                .collect()
        }),
    }
}

/// Command text to send after creation, if the definition has one.
pub fn startup_command(def: &TerminalDefinition, ctx: &SubstitutionContext) -> Option<String> {
    def.command
        .as_deref()
        .filter(|command| !command.is_empty())
        .map(|command| substitute(command, ctx))
}

/// Index of the terminal to foreground after a group launch.
///
/// The first terminal flagged `focus` wins; otherwise the last one. `None`
/// only for an empty group.
pub fn focus_index(terminals: &[TerminalDefinition]) -> Option<usize> {
    terminals
        .iter()
        .position(TerminalDefinition::wants_focus)
        .or_else(|| terminals.len().checked_sub(1))
}
