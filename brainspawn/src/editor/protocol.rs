//! Messages exchanged with the configuration editor.
//!
//! Both directions are JSON objects tagged by `type`:
//!
//! ```json
//! {"type":"saveConfig","config":{"version":1,"groups":[...]}}
//! {"type":"error","message":"Configuration must have a \"groups\" array"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::schema::validate_config;
use crate::core::types::BrainSpawnConfig;
use crate::host::Prompter;
use crate::store::ConfigStore;

/// Request sent by the editor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorRequest {
    Ready,
    GetConfig,
    /// Raw, not yet validated configuration.
    SaveConfig { config: Value },
    PickFolder,
}

/// Message pushed to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorMessage {
    Config { config: BrainSpawnConfig },
    FolderPicked { path: String },
    Error { message: String },
}

impl EditorMessage {
    pub fn config(config: &BrainSpawnConfig) -> Self {
        EditorMessage::Config {
            config: config.clone(),
        }
    }
}

/// Answer one editor request.
///
/// A failed save leaves the store untouched and yields a single
/// [`EditorMessage::Error`]; a successful one yields nothing (subscribers
/// see the reload instead).
pub fn handle_request(
    request: EditorRequest,
    store: &mut ConfigStore,
    prompter: &dyn Prompter,
) -> Vec<EditorMessage> {
    match request {
        EditorRequest::Ready | EditorRequest::GetConfig => {
            vec![EditorMessage::config(&store.config())]
        }
        EditorRequest::SaveConfig { config } => {
            let saved = validate_config(&config).and_then(|config| store.save_all(&config));
            match saved {
                Ok(()) => {
                    debug!("editor save applied");
                    Vec::new()
                }
                Err(err) => {
                    warn!(error = %err, "editor save rejected");
                    vec![EditorMessage::Error {
                        message: format!("{err:#}"),
                    }]
                }
            }
        }
        EditorRequest::PickFolder => match prompter.pick_folder() {
            Some(path) => vec![EditorMessage::FolderPicked {
                path: path.display().to_string(),
            }],
            None => Vec::new(),
        },
    }
}
