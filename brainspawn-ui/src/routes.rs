//! HTTP route handlers for the editor API.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use tracing::{debug, warn};

use brainspawn::core::types::BrainSpawnConfig;
use brainspawn::editor::protocol::{EditorMessage, EditorRequest, handle_request};
use brainspawn::host::Headless;

use crate::state::AppState;

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config))
        .route("/messages", post(post_message))
}

async fn health() -> &'static str {
    "ok"
}

/// GET /api/config - current merged snapshot, `source` tags included.
async fn get_config(State(state): State<AppState>) -> Result<Json<BrainSpawnConfig>, StatusCode> {
    let store = state.store().map_err(|err| {
        warn!(error = %err, "config store unavailable");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json((*store.config()).clone()))
}

/// POST /api/messages - one editor request, answered with its replies.
///
/// Folder picking needs a local dialog, so `pickFolder` never yields a reply
/// over HTTP.
async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<EditorRequest>,
) -> Result<Json<Vec<EditorMessage>>, StatusCode> {
    debug!(?request, "editor request");
    let mut store = state.store().map_err(|err| {
        warn!(error = %err, "config store unavailable");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(handle_request(request, &mut store, &Headless)))
}
