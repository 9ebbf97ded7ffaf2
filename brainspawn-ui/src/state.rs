//! Shared application state for the UI server.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::broadcast;
use tracing::debug;

use brainspawn::editor::echo::EchoSuppressor;
use brainspawn::editor::protocol::EditorMessage;
use brainspawn::store::ConfigStore;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<ConfigStore>>,
    /// Messages pushed to every connected editor.
    pub event_tx: Arc<broadcast::Sender<EditorMessage>>,
}

impl AppState {
    /// Wrap `store` and forward its reloads to editors, dropping watcher
    /// echoes that arrive within `echo_window` of a save.
    pub fn new(mut store: ConfigStore, echo_window: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let event_tx = Arc::new(event_tx);

        let tx = Arc::clone(&event_tx);
        let mut echo = EchoSuppressor::new(echo_window);
        store.on_change(move |event| {
            if !echo.should_forward(event.reason) {
                debug!(reason = ?event.reason, "dropping echo of recent save");
                return Ok(());
            }
            // No receivers is fine: nobody has the editor open.
            let _ = tx.send(EditorMessage::config(&event.config));
            Ok(())
        });
        if !store.is_loaded() {
            store.load();
        }

        Self {
            store: Arc::new(Mutex::new(store)),
            event_tx,
        }
    }

    pub fn store(&self) -> Result<MutexGuard<'_, ConfigStore>> {
        self.store
            .lock()
            .map_err(|_| anyhow!("config store lock poisoned"))
    }
}
