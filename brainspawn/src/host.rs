//! Host collaborators: terminal sessions, user prompts and notifications.
//!
//! The editor host owns the real implementations. This module defines the
//! narrow contracts the rest of the crate depends on, plus the headless and
//! recording implementations the CLI uses.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::launch_plan::TerminalOptions;
use crate::editor::protocol::EditorMessage;

/// Host-assigned identifier of a live terminal session.
pub type TerminalId = u64;

/// A live terminal session owned by the host.
pub trait TerminalHandle: Send {
    fn id(&self) -> TerminalId;
    fn send_text(&self, text: &str);
    /// Bring the terminal to the foreground.
    fn show(&self);
    fn dispose(&self);
}

/// Creates terminal sessions.
pub trait TerminalHost {
    fn create(&mut self, options: TerminalOptions) -> Result<Box<dyn TerminalHandle>>;
}

/// One entry of a selection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: String,
}

/// User-facing dialogs. Every method returns `None` when dismissed.
pub trait Prompter {
    /// Warning dialog with buttons; returns the chosen label.
    fn confirm(&self, message: &str, buttons: &[&str]) -> Option<String>;
    /// Informational message with optional action buttons.
    fn inform(&self, message: &str, actions: &[&str]) -> Option<String>;
    /// Selection list; returns the chosen index.
    fn pick(&self, placeholder: &str, items: &[PickItem]) -> Option<usize>;
    fn pick_folder(&self) -> Option<PathBuf>;
}

/// Channel for warnings that must reach the user.
pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
}

/// Delivers messages to an open configuration editor.
pub type MessageSink = Box<dyn FnMut(&EditorMessage) + Send>;

/// Hosts the configuration editor surface.
pub trait EditorHost {
    /// Create the editor panel and return its message sink.
    fn open_panel(&mut self) -> MessageSink;
    fn reveal_panel(&mut self);
}

/// Prompter for non-interactive contexts: every dialog is dismissed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Prompter for Headless {
    fn confirm(&self, _message: &str, _buttons: &[&str]) -> Option<String> {
        None
    }

    fn inform(&self, _message: &str, _actions: &[&str]) -> Option<String> {
        None
    }

    fn pick(&self, _placeholder: &str, _items: &[PickItem]) -> Option<usize> {
        None
    }

    fn pick_folder(&self) -> Option<PathBuf> {
        None
    }
}

impl EditorHost for Headless {
    fn open_panel(&mut self) -> MessageSink {
        Box::new(|message| debug!(?message, "no editor attached"))
    }

    fn reveal_panel(&mut self) {}
}

/// Writes user warnings to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

/// Keeps every warning for later inspection.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn warn(&self, message: &str) {
        warn!("{message}");
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// What happened to one terminal created through [`RecordingHost`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordedTerminal {
    pub id: TerminalId,
    pub options: Option<TerminalOptions>,
    pub sent: Vec<String>,
    pub shown: bool,
    pub disposed: bool,
}

/// Terminal host that only records what would have happened.
///
/// Used by `brainspawn plan` to show a launch without starting processes.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    log: Arc<Mutex<Vec<RecordedTerminal>>>,
}

impl RecordingHost {
    pub fn terminals(&self) -> Vec<RecordedTerminal> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

impl TerminalHost for RecordingHost {
    fn create(&mut self, options: TerminalOptions) -> Result<Box<dyn TerminalHandle>> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| anyhow::anyhow!("recording host poisoned"))?;
        let id = log.len() as TerminalId + 1;
        log.push(RecordedTerminal {
            id,
            options: Some(options),
            ..RecordedTerminal::default()
        });
        Ok(Box::new(RecordedHandle {
            id,
            log: Arc::clone(&self.log),
        }))
    }
}

struct RecordedHandle {
    id: TerminalId,
    log: Arc<Mutex<Vec<RecordedTerminal>>>,
}

impl RecordedHandle {
    fn update(&self, f: impl FnOnce(&mut RecordedTerminal)) {
        if let Ok(mut log) = self.log.lock()
            && let Some(entry) = log.iter_mut().find(|entry| entry.id == self.id)
        {
            f(entry);
        }
    }
}

impl TerminalHandle for RecordedHandle {
    fn id(&self) -> TerminalId {
        self.id
    }

    fn send_text(&self, text: &str) {
        self.update(|entry| entry.sent.push(text.to_string()));
    }

    fn show(&self) {
        self.update(|entry| entry.shown = true);
    }

    fn dispose(&self) {
        self.update(|entry| entry.disposed = true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_host_tracks_handle_calls() {
        let mut host = RecordingHost::default();
        let options = TerminalOptions {
            name: "web".to_string(),
            icon_id: "terminal".to_string(),
            color_id: None,
            cwd: None,
            env: None,
        };
        let handle = host.create(options.clone()).expect("create");
        handle.send_text("npm start");
        handle.show();

        let terminals = host.terminals();
        assert_eq!(terminals.len(), 1);
        assert_eq!(terminals[0].options, Some(options));
        assert_eq!(terminals[0].sent, vec!["npm start".to_string()]);
        assert!(terminals[0].shown);
        assert!(!terminals[0].disposed);
    }

    #[test]
    fn collecting_notifier_keeps_order() {
        let notifier = CollectingNotifier::default();
        notifier.warn("first");
        notifier.warn("second");
        assert_eq!(notifier.messages(), vec!["first", "second"]);
    }
}
