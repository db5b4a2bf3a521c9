//! Integration tests for the `stg` CLI.
//!
//! Each test creates a temp data directory, runs `stg` as a subprocess,
//! and verifies stdout and/or file contents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Get the path to the built `stg` binary.
fn stg_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_stg"))
}

/// Create a data directory with two grows.
fn create_test_data(root: &Path) -> PathBuf {
    let data = root.join("stagesync");
    fs::create_dir_all(data.join("entries")).unwrap();
    fs::write(
        data.join("grows.json"),
        r#"[
  {
    "id": "tent-a",
    "name": "Tent A",
    "plants": [
      { "id": "a1", "stage": "veg" },
      { "id": "a2", "stage": "flower" },
      { "id": "a3", "stage": "Vegetative" }
    ]
  },
  {
    "id": "tent-b",
    "plants": [
      { "id": "b1", "stage": "veg" },
      { "stage": "vegetative" }
    ]
  },
  { "id": "seed-tray", "stage": "Seedling" }
]
"#,
    )
    .unwrap();
    data
}

/// Run `stg` in `dir`, returning (stdout, stderr, success).
fn run_stg(dir: &Path, args: &[&str]) -> (String, String, bool) {
    run_stg_with_input(dir, args, "")
}

fn run_stg_with_input(dir: &Path, args: &[&str], input: &str) -> (String, String, bool) {
    let mut child = Command::new(stg_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("STAGESYNC_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run stg");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn read_grows(data: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(data.join("grows.json")).unwrap()).unwrap()
}

// ============================================================================
// Read commands
// ============================================================================

#[test]
fn stage_normalizes_without_data_dir() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (stdout, _, ok) = run_stg(tmp.path(), &["stage", "Flowering"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "Flower (stored as \"flower\")");

    let (stdout, _, ok) = run_stg(tmp.path(), &["stage", "harvest"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "no stage");
}

#[test]
fn grows_lists_aggregates() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    let (stdout, _, ok) = run_stg(tmp.path(), &["--json", "grows"]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json[0]["aggregate"], "Mixed");
    assert_eq!(json[1]["aggregate"], "Vegetative");
    assert_eq!(json[2]["aggregate"], "Seedling");
    assert_eq!(json[2]["plants"], 0);
}

#[test]
fn aggregate_over_selected_plants() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    let (stdout, _, ok) = run_stg(
        tmp.path(),
        &["aggregate", "tent-a", "--plant", "a1", "--plant", "a3"],
    );
    assert!(ok);
    assert_eq!(stdout.trim(), "Vegetative");

    let (_, stderr, ok) = run_stg(tmp.path(), &["aggregate", "nope"]);
    assert!(!ok);
    assert!(stderr.contains("grow not found: nope"));
}

#[test]
fn missing_data_dir_is_an_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, ok) = run_stg(tmp.path(), &["grows"]);
    assert!(!ok);
    assert!(stderr.contains("no stagesync data directory"));
}

// ============================================================================
// Draft editing
// ============================================================================

#[test]
fn apply_rejected_for_mixed_grow() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    let (_, _, ok) = run_stg(tmp.path(), &["draft", "grow", "tent-a"]);
    assert!(ok);

    let (stdout, stderr, ok) = run_stg(tmp.path(), &["draft", "apply", "on"]);
    assert!(!ok);
    assert!(stderr.contains("Select specific plants before updating"));
    assert!(stdout.contains("apply:     off (ambiguous)"));
}

#[test]
fn narrowing_selection_enables_apply() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    run_stg(tmp.path(), &["draft", "grow", "tent-a"]);
    let (_, _, ok) = run_stg(tmp.path(), &["draft", "plants", "a1", "a3"]);
    assert!(ok);

    let (stdout, _, ok) = run_stg(tmp.path(), &["--json", "draft", "apply", "on"]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["state"], "eligible");
    assert_eq!(json["draft"]["apply_stage_to_plants"], true);
    assert_eq!(json["draft"]["stage"], "Vegetative");

    // Widening back to the whole grow turns it off again
    let (stdout, _, ok) = run_stg(tmp.path(), &["--json", "draft", "plants"]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["state"], "ambiguous");
    assert_eq!(json["draft"]["apply_stage_to_plants"], false);
}

#[test]
fn unknown_stage_argument_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_data(tmp.path());
    let (_, stderr, ok) = run_stg(tmp.path(), &["draft", "stage", "budding"]);
    assert!(!ok);
    assert!(stderr.contains("unrecognized stage: budding"));
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn seeded_stage_follows_snapshot_between_runs() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = create_test_data(tmp.path());
    run_stg(tmp.path(), &["draft", "grow", "tent-b"]);
    let (_, _, ok) = run_stg(tmp.path(), &["draft", "apply", "on"]);
    assert!(ok);

    // Both tent-b plants moved to flower outside stg
    let mut grows = read_grows(&data);
    grows[1]["plants"][0]["stage"] = "flower".into();
    grows[1]["plants"][1]["stage"] = "flowering".into();
    fs::write(data.join("grows.json"), grows.to_string()).unwrap();

    let (stdout, _, ok) = run_stg(tmp.path(), &["--json", "draft", "show"]);
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["draft"]["apply_stage_to_plants"], true);
    assert_eq!(json["draft"]["stage"], "Flower");
}

fn prepare_flower_sync(dir: &Path) {
    run_stg(dir, &["draft", "grow", "tent-b"]);
    let (_, _, ok) = run_stg(dir, &["draft", "apply", "on"]);
    assert!(ok);
    let (_, _, ok) = run_stg(dir, &["draft", "stage", "Flower"]);
    assert!(ok);
}

#[test]
fn declined_save_keeps_draft_and_plants() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = create_test_data(tmp.path());
    prepare_flower_sync(tmp.path());
    let draft_before = fs::read_to_string(data.join("draft.json")).unwrap();

    let (stdout, stderr, ok) = run_stg_with_input(tmp.path(), &["save"], "n\n");
    assert!(ok);
    assert!(stderr.contains("Update the stage of all plants in this grow to Flower?"));
    assert!(stdout.contains("Save cancelled"));

    assert_eq!(fs::read_to_string(data.join("draft.json")).unwrap(), draft_before);
    assert_eq!(read_grows(&data)[1]["plants"][0]["stage"], "veg");
    assert_eq!(fs::read_dir(data.join("entries")).unwrap().count(), 0);
}

#[test]
fn confirmed_save_cascades_to_plants() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = create_test_data(tmp.path());
    prepare_flower_sync(tmp.path());

    let (stdout, _, ok) = run_stg_with_input(tmp.path(), &["--json", "save"], "y\n");
    assert!(ok);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["saved"], true);
    assert_eq!(json["entry"], "E-001");
    assert_eq!(json["payload"]["stage"], "flower");
    assert_eq!(json["payload"]["plants"], serde_json::json!([]));

    let grows = read_grows(&data);
    assert_eq!(grows[1]["plants"][0]["stage"], "flower");
    assert_eq!(grows[1]["plants"][1]["stage"], "flower");
    // Other grows untouched
    assert_eq!(grows[0]["plants"][1]["stage"], "flower");
    assert_eq!(grows[0]["plants"][0]["stage"], "veg");

    assert!(data.join("entries/E-001.json").exists());
    assert!(!data.join("draft.json").exists());
}

#[test]
fn plain_save_needs_no_confirmation() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = create_test_data(tmp.path());
    run_stg(tmp.path(), &["draft", "grow", "tent-a"]);
    run_stg(tmp.path(), &["draft", "stage", "drying"]);
    run_stg(tmp.path(), &["draft", "text", "--title", "Chop day"]);

    let (stdout, stderr, ok) = run_stg(tmp.path(), &["save"]);
    assert!(ok);
    assert!(!stderr.contains("[y/N]"));
    assert_eq!(stdout.trim(), "Saved E-001");

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data.join("entries/E-001.json")).unwrap())
            .unwrap();
    assert_eq!(stored["stage"], "drying");
    assert_eq!(stored["title"], "Chop day");
    assert_eq!(stored["applyStageToPlants"], false);
    assert!(stored["savedAt"].is_string());
    assert_eq!(read_grows(&data)[0]["plants"][0]["stage"], "veg");
}

#[test]
fn yes_flag_and_update() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = create_test_data(tmp.path());
    run_stg(tmp.path(), &["draft", "grow", "tent-a"]);
    run_stg(tmp.path(), &["save"]);

    run_stg(tmp.path(), &["draft", "grow", "tent-a"]);
    run_stg(tmp.path(), &["draft", "plants", "a2"]);
    run_stg(tmp.path(), &["draft", "apply", "on"]);
    run_stg(tmp.path(), &["draft", "stage", "drying"]);
    let (stdout, _, ok) = run_stg(tmp.path(), &["save", "--yes", "--update", "E-001"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "Saved E-001");

    let grows = read_grows(&data);
    assert_eq!(grows[0]["plants"][1]["stage"], "drying");
    assert_eq!(grows[0]["plants"][0]["stage"], "veg");
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn legacy_key_override_round_trips() {
    let tmp = tempfile::TempDir::new().unwrap();
    let data = create_test_data(tmp.path());
    fs::write(data.join("stagesync.toml"), "[stages.aliases]\ndry = \"Drying\"\n").unwrap();

    let (_, _, ok) = run_stg(tmp.path(), &["config", "set-legacy-key", "Drying", "dry"]);
    assert!(ok);
    let (stdout, _, ok) = run_stg(tmp.path(), &["stage", "Drying"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "Drying (stored as \"dry\")");

    let (_, stderr, ok) = run_stg(tmp.path(), &["config", "set-legacy-key", "Curing", "cure"]);
    assert!(!ok);
    assert!(stderr.contains("does not normalize back"));
}
