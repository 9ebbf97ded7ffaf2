//! Test-only fakes for host collaborators and model builders.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::launch_plan::TerminalOptions;
use crate::core::types::{GroupSource, SpawnGroup, TerminalDefinition};
use crate::editor::protocol::EditorMessage;
use crate::host::{
    EditorHost, MessageSink, PickItem, Prompter, TerminalHandle, TerminalHost, TerminalId,
};
use crate::io::paths::ProjectPaths;
use crate::io::settings::{SettingInspection, SettingsStore};

/// Terminal definition with only a name.
pub fn terminal(name: &str) -> TerminalDefinition {
    TerminalDefinition::named(name)
}

/// Terminal definition flagged for focus.
pub fn focused_terminal(name: &str) -> TerminalDefinition {
    TerminalDefinition {
        focus: Some(true),
        ..TerminalDefinition::named(name)
    }
}

/// Group without a source tag.
pub fn group(name: &str, terminals: Vec<TerminalDefinition>) -> SpawnGroup {
    SpawnGroup {
        name: name.to_string(),
        terminals,
        source: None,
    }
}

pub fn workspace_group(name: &str, terminals: Vec<TerminalDefinition>) -> SpawnGroup {
    group(name, terminals).with_source(GroupSource::Workspace)
}

pub fn user_group(name: &str, terminals: Vec<TerminalDefinition>) -> SpawnGroup {
    group(name, terminals).with_source(GroupSource::User)
}

/// Temporary project root with `contents` as its project file.
pub fn project_with_file(contents: &str) -> Result<TempDir> {
    let root = tempfile::tempdir().context("create temp project")?;
    let paths = ProjectPaths::new(root.path());
    fs::create_dir_all(&paths.vscode_dir).context("create .vscode")?;
    fs::write(&paths.config_path, contents).context("write project file")?;
    Ok(root)
}

#[derive(Debug, Default)]
struct MemorySettings {
    global: BTreeMap<String, Value>,
    workspace: BTreeMap<String, Value>,
}

/// In-memory settings; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<Mutex<MemorySettings>>,
    path: Option<PathBuf>,
}

impl MemorySettingsStore {
    /// Report `path` as the global settings file (for watcher wiring tests).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn set_global(&self, key: &str, value: Value) {
        self.inner
            .lock()
            .expect("settings lock")
            .global
            .insert(key.to_string(), value);
    }

    pub fn set_workspace(&self, key: &str, value: Value) {
        self.inner
            .lock()
            .expect("settings lock")
            .workspace
            .insert(key.to_string(), value);
    }

    pub fn global(&self, key: &str) -> Option<Value> {
        self.inner
            .lock()
            .expect("settings lock")
            .global
            .get(key)
            .cloned()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn inspect(&self, key: &str) -> Result<SettingInspection> {
        let inner = self.inner.lock().expect("settings lock");
        Ok(SettingInspection {
            global_value: inner.global.get(key).cloned(),
            workspace_value: inner.workspace.get(key).cloned(),
        })
    }

    fn update_global(&mut self, key: &str, value: Option<Value>) -> Result<()> {
        let mut inner = self.inner.lock().expect("settings lock");
        match value {
            Some(value) => inner.global.insert(key.to_string(), value),
            None => inner.global.remove(key),
        };
        Ok(())
    }

    fn global_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Host call observed by [`FakeTerminalHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Create { id: TerminalId, options: TerminalOptions },
    SendText { id: TerminalId, text: String },
    Show { id: TerminalId },
    Dispose { id: TerminalId },
}

/// Terminal host that logs every call in order.
#[derive(Debug, Clone, Default)]
pub struct FakeTerminalHost {
    calls: Arc<Mutex<Vec<HostCall>>>,
    next_id: TerminalId,
}

impl FakeTerminalHost {
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Ids passed to `show`, in order.
    pub fn shown(&self) -> Vec<TerminalId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Show { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn disposed(&self) -> Vec<TerminalId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Dispose { id } => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Created terminal names with their ids.
    pub fn created(&self) -> Vec<(TerminalId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Create { id, options } => Some((id, options.name)),
                _ => None,
            })
            .collect()
    }
}

impl TerminalHost for FakeTerminalHost {
    fn create(&mut self, options: TerminalOptions) -> Result<Box<dyn TerminalHandle>> {
        self.next_id += 1;
        let id = self.next_id;
        self.calls
            .lock()
            .expect("calls lock")
            .push(HostCall::Create { id, options });
        Ok(Box::new(FakeHandle {
            id,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct FakeHandle {
    id: TerminalId,
    calls: Arc<Mutex<Vec<HostCall>>>,
}

impl FakeHandle {
    fn record(&self, call: HostCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl TerminalHandle for FakeHandle {
    fn id(&self) -> TerminalId {
        self.id
    }

    fn send_text(&self, text: &str) {
        self.record(HostCall::SendText {
            id: self.id,
            text: text.to_string(),
        });
    }

    fn show(&self) {
        self.record(HostCall::Show { id: self.id });
    }

    fn dispose(&self) {
        self.record(HostCall::Dispose { id: self.id });
    }
}

/// Canned answer for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Button(String),
    Pick(usize),
    Folder(PathBuf),
    Dismiss,
}

/// Prompter that replays queued answers and records every question.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Messages and placeholders shown so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn next(&self, question: &str) -> Answer {
        self.asked.borrow_mut().push(question.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(Answer::Dismiss)
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, _buttons: &[&str]) -> Option<String> {
        match self.next(message) {
            Answer::Button(label) => Some(label),
            _ => None,
        }
    }

    fn inform(&self, message: &str, _actions: &[&str]) -> Option<String> {
        match self.next(message) {
            Answer::Button(label) => Some(label),
            _ => None,
        }
    }

    /// Returns the scripted index as is, even when it is out of range.
    fn pick(&self, placeholder: &str, _items: &[PickItem]) -> Option<usize> {
        match self.next(placeholder) {
            Answer::Pick(index) => Some(index),
            _ => None,
        }
    }

    fn pick_folder(&self) -> Option<PathBuf> {
        match self.next("pick folder") {
            Answer::Folder(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EditorLog {
    opened: usize,
    revealed: usize,
    messages: Vec<EditorMessage>,
}

/// Editor host that records panel lifecycle and pushed messages.
#[derive(Debug, Clone, Default)]
pub struct RecordingEditor {
    log: Arc<Mutex<EditorLog>>,
}

impl RecordingEditor {
    pub fn opened(&self) -> usize {
        self.log.lock().expect("editor lock").opened
    }

    pub fn revealed(&self) -> usize {
        self.log.lock().expect("editor lock").revealed
    }

    pub fn messages(&self) -> Vec<EditorMessage> {
        self.log.lock().expect("editor lock").messages.clone()
    }
}

impl EditorHost for RecordingEditor {
    fn open_panel(&mut self) -> MessageSink {
        self.log.lock().expect("editor lock").opened += 1;
        let log = Arc::clone(&self.log);
        Box::new(move |message| {
            log.lock()
                .expect("editor lock")
                .messages
                .push(message.clone());
        })
    }

    fn reveal_panel(&mut self) {
        self.log.lock().expect("editor lock").revealed += 1;
    }
}
