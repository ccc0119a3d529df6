//! Runs the `add-sdw-variants` binary against temporary preprocessed trees

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use sdw_test_utils::{default_variant_names, plain_plans, read_json, write_json, PreprocessedTree};
use serde_json::Value;

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_add-sdw-variants"))
        .args(args)
        .env("nnUNet_preprocessed", root)
        .env_remove("RUST_LOG")
        .output()
        .expect("binary runs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn config_count(plans: &Value) -> usize {
    plans["configurations"].as_object().unwrap().len()
}

#[test]
fn add_writes_all_variants_and_a_backup() {
    let tree = PreprocessedTree::new();
    let output = run(tree.root(), &["add", "-d", "5"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Adding S/D/W variants to Dataset005_Prostate based on 3d_fullres..."));
    assert!(out.contains("Successfully added 18 configurations"));
    assert!(out.contains("Total configurations now: 21"));

    let backup = tree.plans_path().with_extension("json.bak");
    assert!(out.contains("Backup created:"));
    assert_eq!(read_json(&backup), plain_plans());
    assert_eq!(config_count(&tree.read_plans()), 21);
}

#[test]
fn second_run_adds_nothing() {
    let tree = PreprocessedTree::new();
    assert!(run(tree.root(), &["add", "-d", "5"]).status.success());
    let first = std::fs::read_to_string(tree.plans_path()).unwrap();

    let output = run(tree.root(), &["add", "-d", "5"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No new configurations added (all already exist)"));
    assert_eq!(std::fs::read_to_string(tree.plans_path()).unwrap(), first);
}

#[test]
fn missing_env_var_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_add-sdw-variants"))
        .args(["add", "-d", "5"])
        .env_remove("nnUNet_preprocessed")
        .output()
        .expect("binary runs");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("nnUNet_preprocessed environment variable not set"));
}

#[test]
fn unknown_dataset_fails() {
    let tree = PreprocessedTree::new();
    let output = run(tree.root(), &["add", "-d", "42"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("dataset 42 not found"));
}

#[test]
fn missing_base_configuration_fails_without_writing() {
    let tree = PreprocessedTree::new();
    let output = run(tree.root(), &["add", "-d", "5", "--base", "3d_lowres"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("3d_lowres configuration not found in plans"));
    assert_eq!(tree.read_plans(), plain_plans());
}

#[test]
fn bad_grid_values_fail_without_writing() {
    let tree = PreprocessedTree::new();

    let output = run(tree.root(), &["add", "-d", "5", "--stages", "4,4"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("stages has duplicate value 4"));

    let output = run(tree.root(), &["add", "-d", "5", "--stages", "4000000000"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("stages value 4000000000 exceeds limit 16"));

    assert_eq!(tree.read_plans(), plain_plans());
}

#[test]
fn dry_run_leaves_file_unchanged() {
    let tree = PreprocessedTree::new();
    let output = run(tree.root(), &["add", "-d", "5", "--dry-run"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Dry run: 18 configurations would be written"));
    assert_eq!(tree.read_plans(), plain_plans());
    assert!(!tree.plans_path().with_extension("json.bak").exists());
}

#[test]
fn plans_file_with_custom_grid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plans.json");
    write_json(&path, &plain_plans());

    let output = run(
        dir.path(),
        &[
            "add",
            "--plans-file",
            path.to_str().unwrap(),
            "--stages",
            "4",
            "--depths",
            "2",
            "--widths",
            "16,32",
            "--no-backup",
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let plans = read_json(&path);
    assert_eq!(config_count(&plans), 5);
    assert!(plans["configurations"].get("3d_fullres_S4D2W32").is_some());
    assert!(!dir.path().join("plans.json.bak").exists());
}

#[test]
fn settings_file_is_overridden_by_flags() {
    let tree = PreprocessedTree::new();
    let config = tree.root().join("sdw.toml");
    std::fs::write(&config, "max_features = 256\n\n[grid]\nstages = [5]\ndepths = [3]\n").unwrap();

    let output = run(
        tree.root(),
        &["add", "-d", "5", "--config", config.to_str().unwrap(), "--widths", "64"],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let plans = tree.read_plans();
    assert_eq!(config_count(&plans), 4);
    assert_eq!(
        plans["configurations"]["3d_fullres_S5D3W64"]["architecture"]["arch_kwargs"]
            ["features_per_stage"],
        serde_json::json!([64, 128, 256, 256, 256])
    );
}

#[test]
fn add_json_reports_changes() {
    let tree = PreprocessedTree::new();
    let output = run(tree.root(), &["add", "-d", "5", "--json", "--widths", "32"]);

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["dry_run"], Value::Bool(false));
    assert_eq!(report["report"]["added"].as_array().unwrap().len(), 6);
    assert_eq!(report["report"]["total_configurations"], 9);
    assert!(report["backup"].as_str().unwrap().ends_with(".json.bak"));
}

#[test]
fn list_shows_every_variant() {
    let tree = PreprocessedTree::new();
    assert!(run(tree.root(), &["add", "-d", "5"]).status.success());

    let output = run(tree.root(), &["list", "-d", "5"]);
    assert!(output.status.success());
    let out = stdout(&output);
    for name in default_variant_names() {
        assert!(out.contains(&name), "missing {name}");
    }
    assert!(out.contains("Total: 18 variants"));
    assert!(!out.contains("mismatch"));
}

#[test]
fn list_json_on_untouched_plans_is_empty() {
    let tree = PreprocessedTree::new();
    let output = run(tree.root(), &["list", "-d", "5", "--json"]);

    assert!(output.status.success());
    let entries: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries, serde_json::json!([]));
}
