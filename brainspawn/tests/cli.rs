//! CLI tests for the `brainspawn` binary.
//!
//! Each test isolates the user config directory so a developer's own
//! settings never leak in.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use brainspawn::exit_codes;

fn brainspawn(project: &Path, args: &[&str]) -> Output {
    let settings = project.join("user-settings.toml");
    Command::new(env!("CARGO_BIN_EXE_brainspawn"))
        .env("HOME", project)
        .env("XDG_CONFIG_HOME", project.join("xdg"))
        .arg("--project-dir")
        .arg(project)
        .arg("--settings")
        .arg(&settings)
        .args(args)
        .output()
        .expect("run brainspawn")
}

fn write_project(root: &Path, contents: &str) {
    let dir = root.join(".vscode");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("brain-spawn.json"), contents).expect("write project file");
}

#[test]
fn validate_accepts_both_sources() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_project(
        temp.path(),
        r#"{"groups":[{"name":"dev","terminals":[{"name":"web"}]}]}"#,
    );
    fs::write(
        temp.path().join("user-settings.toml"),
        "[brainSpawn]\ngroups = [{ name = \"ops\", terminals = [] }]\n",
    )
    .expect("write settings");

    let output = brainspawn(temp.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("1 workspace group(s), 1 user group(s)"),
        "{stdout}"
    );
}

#[test]
fn validate_reports_invalid_project_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_project(
        temp.path(),
        r#"{"groups":[{"name":"dev","terminals":[{"color":"teal"}]}]}"#,
    );

    let output = brainspawn(temp.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Brain Spawn: Invalid config"), "{stderr}");
    assert!(stderr.contains("teal"), "{stderr}");
}

#[test]
fn list_prints_groups_with_scope() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_project(
        temp.path(),
        r#"{"groups":[{"name":"dev","terminals":[{"name":"web","command":"npm start"},{"name":"sh"}]}]}"#,
    );

    let output = brainspawn(temp.path(), &["list"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dev (Workspace · 2 terminals)"), "{stdout}");
    assert!(stdout.contains("  - web: npm start"), "{stdout}");
    assert!(stdout.contains("  - sh\n"), "{stdout}");
}

#[test]
fn plan_shows_resolved_terminals() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_project(
        temp.path(),
        r#"{"groups":[{"name":"dev","terminals":[
            {"name":"a","command":"echo ${workspaceFolderBasename}"},
            {"name":"b","focus":true}
        ]}]}"#,
    );
    let basename = temp
        .path()
        .canonicalize()
        .expect("canonicalize")
        .file_name()
        .expect("basename")
        .to_string_lossy()
        .into_owned();

    let output = brainspawn(temp.path(), &["plan", "dev", "--source", "workspace"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let plan: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("plan is json");
    assert_eq!(plan[0]["sent"][0], format!("echo {basename}"));
    assert_eq!(plan[0]["shown"], false);
    assert_eq!(plan[1]["shown"], true);
    assert_eq!(plan[1]["options"]["icon_id"], "terminal");
}

#[test]
fn plan_unknown_group_exits_not_found() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = brainspawn(temp.path(), &["plan", "ghost"]);
    assert_eq!(output.status.code(), Some(exit_codes::NOT_FOUND));

    write_project(temp.path(), r#"{"groups":[{"name":"dev","terminals":[]}]}"#);
    let output = brainspawn(temp.path(), &["plan", "dev", "--source", "user"]);
    assert_eq!(output.status.code(), Some(exit_codes::NOT_FOUND));
}
