//! At most one configuration editor panel per workbench.

use tracing::debug;

use crate::editor::echo::EchoSuppressor;
use crate::editor::protocol::EditorMessage;
use crate::host::EditorHost;
use crate::store::{ConfigStore, ListenerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Opened,
    Revealed,
}

/// Tracks the open editor panel and its store subscription.
#[derive(Debug, Default)]
pub struct PanelGuard {
    subscription: Option<ListenerId>,
}

impl PanelGuard {
    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    /// Open the panel, or reveal it if it is already open.
    ///
    /// While open, store reloads are pushed to the panel as
    /// [`EditorMessage::Config`], except watcher echoes of a recent save.
    pub fn open_or_reveal(
        &mut self,
        store: &mut ConfigStore,
        editor: &mut dyn EditorHost,
    ) -> PanelAction {
        if self.is_open() {
            editor.reveal_panel();
            return PanelAction::Revealed;
        }
        let mut sink = editor.open_panel();
        let mut echo = EchoSuppressor::default();
        let id = store.on_change(move |event| {
            if echo.should_forward(event.reason) {
                sink(&EditorMessage::config(&event.config));
            } else {
                debug!(reason = ?event.reason, "dropping echo of recent save");
            }
            Ok(())
        });
        debug!("editor panel opened");
        self.subscription = Some(id);
        PanelAction::Opened
    }

    /// Forget the panel after the host disposed it.
    pub fn close(&mut self, store: &mut ConfigStore) -> bool {
        match self.subscription.take() {
            Some(id) => {
                debug!("editor panel closed");
                store.unsubscribe(id)
            }
            None => false,
        }
    }
}
