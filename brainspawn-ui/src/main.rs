//! Brain Spawn configuration editor server.
//!
//! Speaks the editor message protocol over HTTP and pushes snapshot changes
//! to connected editors over SSE.

mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use brainspawn::host::LogNotifier;
use brainspawn::io::config::{ToolConfig, load_config};
use brainspawn::io::paths::{ProjectPaths, UserPaths};
use brainspawn::io::settings::TomlSettingsStore;
use brainspawn::store::ConfigStore;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "brainspawn-ui")]
#[command(about = "Web editor for Brain Spawn groups")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3001")]
    port: u16,

    /// Project directory (contains .vscode/brain-spawn.json)
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// User settings file (defaults to <config dir>/brain-spawn/settings.toml)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory containing UI static files (defaults to ./ui/dist relative to project)
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("brainspawn_ui=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let project_dir = args.project_dir.canonicalize().unwrap_or(args.project_dir);
    info!(project_dir = %project_dir.display(), "starting brainspawn-ui");

    let user = UserPaths::discover();
    let tool_config = match &user {
        Some(user) => load_config(&user.tool_config_path)?,
        None => ToolConfig::default(),
    };
    let settings_path = args
        .settings
        .or_else(|| tool_config.settings_path.clone())
        .or_else(|| user.map(|user| user.settings_path))
        .context("no user config directory; pass --settings")?;

    let paths = ProjectPaths::new(&project_dir);
    let settings = TomlSettingsStore::new(settings_path, Some(paths.settings_override_path));
    let store = ConfigStore::new(
        Some(project_dir.as_path()),
        Box::new(settings),
        Arc::new(LogNotifier),
    );
    let targets = store.watch_targets();
    let state = AppState::new(store, tool_config.echo_window());

    sse::start_source_watcher(state.clone(), targets, tool_config.poll_interval());

    let api_router = routes::api_router();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", api_router)
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    let ui_dir = args
        .ui_dir
        .unwrap_or_else(|| project_dir.join("ui").join("dist"));

    if ui_dir.exists() {
        info!(ui_dir = %ui_dir.display(), "serving static UI files");
        app = app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
    } else {
        info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
