//! Save/load round trips through the real backing files.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};

use brainspawn::core::types::{BrainSpawnConfig, GroupSource};
use brainspawn::host::CollectingNotifier;
use brainspawn::io::settings::{GROUPS_KEY, SettingsStore, TomlSettingsStore};
use brainspawn::store::ConfigStore;
use brainspawn::test_support::{terminal, user_group, workspace_group};

fn open(root: &Path, settings: &Path) -> (ConfigStore, CollectingNotifier) {
    let notifier = CollectingNotifier::default();
    let store = ConfigStore::new(
        Some(root),
        Box::new(TomlSettingsStore::new(settings, None)),
        Arc::new(notifier.clone()),
    );
    (store, notifier)
}

fn config() -> BrainSpawnConfig {
    BrainSpawnConfig {
        version: 1,
        groups: vec![
            workspace_group("A", vec![terminal("a1"), terminal("a2")]),
            workspace_group("B", vec![terminal("b1")]),
            user_group("C", vec![terminal("c1")]),
        ],
    }
}

#[test]
fn save_routes_groups_and_reload_reproduces_them() {
    let temp = tempfile::tempdir().expect("tempdir");
    let settings_path = temp.path().join("user").join("settings.toml");
    let (mut store, notifier) = open(temp.path(), &settings_path);

    store.save_all(&config()).expect("save");

    let project_file = temp.path().join(".vscode").join("brain-spawn.json");
    let written: Value =
        serde_json::from_str(&fs::read_to_string(&project_file).expect("read project"))
            .expect("json");
    assert_eq!(
        written,
        json!({
            "version": 1,
            "groups": [
                { "name": "A", "terminals": [{ "name": "a1" }, { "name": "a2" }] },
                { "name": "B", "terminals": [{ "name": "b1" }] }
            ]
        })
    );

    let user = TomlSettingsStore::new(&settings_path, None)
        .inspect(GROUPS_KEY)
        .expect("inspect")
        .global_value;
    assert_eq!(
        user,
        Some(json!([{ "name": "C", "terminals": [{ "name": "c1" }] }]))
    );

    assert_eq!(*store.config(), config());
    let (mut fresh, _) = open(temp.path(), &settings_path);
    assert_eq!(*fresh.load(), config());
    assert!(notifier.messages().is_empty());
}

#[test]
fn saving_without_workspace_groups_deletes_project_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let settings_path = temp.path().join("settings.toml");
    let (mut store, _) = open(temp.path(), &settings_path);
    store.save_all(&config()).expect("save");

    let mut only_user = config();
    only_user
        .groups
        .retain(|group| group.source == Some(GroupSource::User));
    store.save_all(&only_user).expect("save user only");

    assert!(!temp.path().join(".vscode").join("brain-spawn.json").exists());
    assert_eq!(store.config().groups.len(), 1);

    store
        .save_all(&BrainSpawnConfig::default())
        .expect("save nothing");
    let settings = fs::read_to_string(&settings_path).expect("read settings");
    assert!(!settings.contains("groups"), "{settings}");
    assert!(store.config().groups.is_empty());
}

#[test]
fn moving_a_group_between_scopes_moves_its_storage() {
    let temp = tempfile::tempdir().expect("tempdir");
    let settings_path = temp.path().join("settings.toml");
    let (mut store, _) = open(temp.path(), &settings_path);
    store.save_all(&config()).expect("save");

    let mut moved = (*store.config()).clone();
    moved.groups[1].source = Some(GroupSource::User);
    store.save_all(&moved).expect("save moved");

    let reloaded = store.config();
    let names: Vec<(&str, Option<GroupSource>)> = reloaded
        .groups
        .iter()
        .map(|group| (group.name.as_str(), group.source))
        .collect();
    assert_eq!(
        names,
        vec![
            ("A", Some(GroupSource::Workspace)),
            ("B", Some(GroupSource::User)),
            ("C", Some(GroupSource::User)),
        ]
    );
}
