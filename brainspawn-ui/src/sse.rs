//! Server-Sent Events stream and backing-source watcher.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tracing::{info, warn};

use brainspawn::editor::protocol::EditorMessage;
use brainspawn::io::watcher::{SourceWatcher, WatchTargets};

use crate::state::AppState;

fn to_event(message: &EditorMessage) -> Option<Event> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Event::default().event("message").data(json)),
        Err(err) => {
            warn!(error = %err, "failed to serialize editor message");
            None
        }
    }
}

/// SSE endpoint handler.
///
/// Starts with the current snapshot, then relays every forwarded reload.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();
    let initial = state
        .store()
        .map(|store| EditorMessage::config(&store.config()))
        .ok();

    let stream = async_stream::stream! {
        if let Some(event) = initial.as_ref().and_then(to_event) {
            yield Ok(event);
        }

        loop {
            match rx.recv().await {
                Ok(message) => {
                    if let Some(event) = to_event(&message) {
                        yield Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the backing-source watcher in a background task.
pub fn start_source_watcher(state: AppState, targets: WatchTargets, poll_interval: Duration) {
    tokio::spawn(async move {
        if let Err(e) = run_source_watcher(state, targets, poll_interval).await {
            warn!(error = %e, "source watcher failed");
        }
    });
}

async fn run_source_watcher(
    state: AppState,
    targets: WatchTargets,
    poll_interval: Duration,
) -> anyhow::Result<()> {
    let mut watcher = SourceWatcher::new(targets, poll_interval)?;
    info!(targets = ?watcher.targets(), "watching backing sources");

    while let Some(change) = watcher.next_change().await {
        state.store()?.handle_source_change(change);
    }
    Ok(())
}
