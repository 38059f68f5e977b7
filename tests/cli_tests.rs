mod common;

use common::*;
use std::path::Path;
use std::process::Command;

fn cli_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ai-pipeline"))
}

fn chain_yaml(dir: &Path, second_model: &str, max_cost: Option<f64>) -> String {
    let max_cost = max_cost
        .map(|cost| format!("max_cost: {}\n", cost))
        .unwrap_or_default();
    format!(
        r#"
name: cli-chain
output_dir: {output}
temp_dir: {temp}
{max_cost}steps:
  - type: text_to_image
    model: flux_dev
    params:
      prompt: "a lighthouse"
  - type: image_to_video
    model: {second_model}
"#,
        output = dir.join("output").display(),
        temp = dir.join("temp").display(),
    )
}

#[test]
fn test_cli_help() {
    let output = cli_command().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Validate, estimate and dry-run AI content pipeline chains"));
    assert!(stdout.contains("list-models"));
    assert!(stdout.contains("validate"));
    assert!(stdout.contains("estimate"));
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("check-registry"));
}

#[test]
fn test_cli_version() {
    let output = cli_command().arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ai-pipeline"));
}

#[test]
fn test_cli_list_models_by_category() {
    let output = cli_command()
        .args(["list-models", "--category", "image_to_video"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("image_to_video:"));
    assert!(stdout.contains("veo3"));
    assert!(!stdout.contains("flux_dev"));
}

#[test]
fn test_cli_list_models_rejects_unknown_category() {
    let output = cli_command()
        .args(["list-models", "--category", "text_to_hologram"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn test_cli_check_registry() {
    let output = cli_command().arg("check-registry").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no issues"));
}

#[test]
fn test_cli_validate() {
    let dir = create_test_dir();
    let good = write_chain(dir.path(), "good.yaml", &chain_yaml(dir.path(), "veo3", None));

    let output = cli_command().arg("validate").arg(&good).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cli-chain (2 steps)"));

    let bad = write_chain(
        dir.path(),
        "bad.yaml",
        &chain_yaml(dir.path(), "no_such_model", None),
    );
    let output = cli_command().arg("validate").arg(&bad).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unknown model: no_such_model"));
}

#[test]
fn test_cli_validate_missing_path() {
    let output = cli_command()
        .args(["validate", "/nonexistent/chains"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_estimate() {
    let dir = create_test_dir();
    let within = write_chain(
        dir.path(),
        "within.yaml",
        &chain_yaml(dir.path(), "veo3", Some(5.0)),
    );

    let output = cli_command().arg("estimate").arg(&within).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total: $4.0250"));
    assert!(stdout.contains("Within max_cost"));

    let over = write_chain(
        dir.path(),
        "over.yaml",
        &chain_yaml(dir.path(), "veo3", Some(1.0)),
    );
    let output = cli_command().arg("estimate").arg(&over).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_dry_run_writes_report() {
    let dir = create_test_dir();
    let chain = write_chain(dir.path(), "chain.yaml", &chain_yaml(dir.path(), "veo3", None));

    let output = cli_command().arg("dry-run").arg(&chain).output().unwrap();

    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["status"], "success");
    assert_eq!(summary["completed_steps"], 2);
    assert!((summary["total_cost"].as_f64().unwrap() - 4.025).abs() < 1e-9);

    let reports: Vec<_> = std::fs::read_dir(dir.path().join("output").join("reports"))
        .unwrap()
        .collect();
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_cli_dry_run_applies_runner_config() {
    let dir = create_test_dir();
    let chain = write_chain(dir.path(), "chain.yaml", &chain_yaml(dir.path(), "veo3", None));
    write_chain(dir.path(), "runner.yaml", "max_cost: 1.0\n");

    let output = cli_command().arg("dry-run").arg(&chain).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["status"], "failed");
    assert_eq!(summary["error_kind"], "cost_limit_exceeded");
}
