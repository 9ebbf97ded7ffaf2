//! `brainspawn`: inspect, plan and watch spawn-group configuration.
//!
//! Reads the project file (`<project>/.vscode/brain-spawn.json`) and the
//! user settings file, the same two sources the editor integration merges.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;

use brainspawn::commands::{Command as WorkbenchCommand, Workbench};
use brainspawn::core::types::GroupSource;
use brainspawn::exit_codes;
use brainspawn::host::{CollectingNotifier, Headless, LogNotifier, Notifier, RecordingHost};
use brainspawn::io::config::{ToolConfig, load_config};
use brainspawn::io::paths::{ProjectPaths, UserPaths};
use brainspawn::io::settings::TomlSettingsStore;
use brainspawn::io::watcher::SourceWatcher;
use brainspawn::logging;
use brainspawn::store::{ChangeReason, ConfigStore};
use brainspawn::terminals::registry::TerminalRegistry;
use brainspawn::views::{StatusBarState, tree_items};

#[derive(Parser)]
#[command(
    name = "brainspawn",
    version,
    about = "Named groups of terminal sessions, launched as a unit"
)]
struct Cli {
    /// Project root holding `.vscode/brain-spawn.json`.
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// User settings file (defaults to `<config dir>/brain-spawn/settings.toml`).
    #[arg(long)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load both sources and report any warning.
    Validate,
    /// Print the merged groups and their terminals.
    List,
    /// Show what launching a group would create, without starting anything.
    Plan {
        group: String,
        /// Only match a group from this source (`workspace` or `user`).
        #[arg(long, value_parser = parse_source)]
        source: Option<GroupSource>,
    },
    /// Reload and print the merged groups whenever a source changes.
    Watch,
}

fn parse_source(raw: &str) -> Result<GroupSource, String> {
    raw.parse().map_err(|err: anyhow::Error| err.to_string())
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let user = UserPaths::discover();
    let tool_config = match &user {
        Some(user) => load_config(&user.tool_config_path)?,
        None => ToolConfig::default(),
    };
    let settings_path = cli
        .settings
        .clone()
        .or_else(|| tool_config.settings_path.clone())
        .or_else(|| user.map(|user| user.settings_path))
        .context("no user config directory; pass --settings")?;

    let project_dir = cli
        .project_dir
        .canonicalize()
        .with_context(|| format!("resolve project dir {}", cli.project_dir.display()))?;

    match cli.command {
        Command::Validate => cmd_validate(&project_dir, &settings_path),
        Command::List => cmd_list(&project_dir, &settings_path),
        Command::Plan { group, source } => cmd_plan(&project_dir, &settings_path, group, source),
        Command::Watch => cmd_watch(&project_dir, &settings_path, &tool_config),
    }
}

fn open_store(project_dir: &Path, settings_path: &Path, notifier: Arc<dyn Notifier>) -> ConfigStore {
    let paths = ProjectPaths::new(project_dir);
    let settings = TomlSettingsStore::new(settings_path, Some(paths.settings_override_path));
    ConfigStore::new(Some(project_dir), Box::new(settings), notifier)
}

fn cmd_validate(project_dir: &Path, settings_path: &Path) -> Result<i32> {
    let notifier = CollectingNotifier::default();
    let mut store = open_store(project_dir, settings_path, Arc::new(notifier.clone()));
    let config = store.load();

    let warnings = notifier.messages();
    for warning in &warnings {
        eprintln!("{warning}");
    }
    if !warnings.is_empty() {
        return Ok(exit_codes::INVALID);
    }
    println!(
        "ok: {} workspace group(s), {} user group(s)",
        config.groups_from(GroupSource::Workspace).count(),
        config.groups_from(GroupSource::User).count()
    );
    Ok(exit_codes::OK)
}

fn cmd_list(project_dir: &Path, settings_path: &Path) -> Result<i32> {
    let bench = Workbench::new(
        open_store(project_dir, settings_path, Arc::new(LogNotifier)),
        Box::new(RecordingHost::default()),
        Box::new(Headless),
        Box::new(Headless),
    );
    print_groups(&bench);
    Ok(exit_codes::OK)
}

fn print_groups(bench: &Workbench) {
    let items = bench.tree_items();
    if items.is_empty() {
        println!("No spawn groups configured.");
        return;
    }
    for item in items {
        println!("{} ({})", item.label, item.description);
        for child in item.children {
            if child.description.is_empty() {
                println!("  - {}", child.label);
            } else {
                println!("  - {}: {}", child.label, child.description);
            }
        }
    }
}

fn cmd_plan(
    project_dir: &Path,
    settings_path: &Path,
    group: String,
    source: Option<GroupSource>,
) -> Result<i32> {
    let host = RecordingHost::default();
    let mut bench = Workbench::new(
        open_store(project_dir, settings_path, Arc::new(LogNotifier)),
        Box::new(host.clone()),
        Box::new(Headless),
        Box::new(Headless),
    );
    if bench.store().config().find_group(&group, source).is_none() {
        eprintln!("Spawn group \"{group}\" not found");
        return Ok(exit_codes::NOT_FOUND);
    }

    bench.execute(WorkbenchCommand::LaunchGroup {
        name: group,
        source,
    })?;
    let plan = serde_json::to_string_pretty(&host.terminals()).context("serialize plan")?;
    println!("{plan}");
    eprintln!("{}", StatusBarState::from_registry(bench.registry()).tooltip);
    Ok(exit_codes::OK)
}

fn cmd_watch(project_dir: &Path, settings_path: &Path, tool_config: &ToolConfig) -> Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    runtime.block_on(async {
        let mut store = open_store(project_dir, settings_path, Arc::new(LogNotifier));
        store.on_change(|event| {
            println!("-- {:?}", event.reason);
            for item in tree_items(&event.config, &TerminalRegistry::new()) {
                println!("{} ({})", item.label, item.description);
            }
            Ok(())
        });
        store.refresh(ChangeReason::Initial);

        let mut watcher = SourceWatcher::new(store.watch_targets(), tool_config.poll_interval())?;
        info!(targets = ?watcher.targets(), "watching backing sources");
        while let Some(change) = watcher.next_change().await {
            store.handle_source_change(change);
        }
        Err(anyhow!("file watcher stopped"))
    })
}
