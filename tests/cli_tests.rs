//! CLI interface tests

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn structrans() -> Command {
    Command::new(env!("CARGO_BIN_EXE_structrans"))
}

/// A config that never touches the network before failing.
fn offline_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(
        &path,
        "[services]\norder = [\"google\"]\nlibretranslate_selfhost_enabled = false\n",
    )
    .unwrap();
    path
}

#[test]
fn test_help_command() {
    let output = structrans()
        .arg("--help")
        .output()
        .expect("Failed to run help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("csv"), "Should list csv command");
    assert!(stdout.contains("xml"), "Should list xml command");
    assert!(stdout.contains("batch"), "Should list batch command");
    assert!(stdout.contains("config"), "Should list config command");
}

#[test]
fn test_version_command() {
    let output = structrans()
        .arg("--version")
        .output()
        .expect("Failed to run version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("structrans"), "Should show program name");
}

#[test]
fn test_csv_help() {
    let output = structrans()
        .args(["csv", "--help"])
        .output()
        .expect("Failed to run csv help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--columns"), "Should have columns option");
    assert!(stdout.contains("--delimiter"), "Should have delimiter option");
    assert!(stdout.contains("--suffix"), "Should have suffix option");
    assert!(stdout.contains("--glossary"), "Should have glossary option");
}

#[test]
fn test_batch_help() {
    let output = structrans()
        .args(["batch", "--help"])
        .output()
        .expect("Failed to run batch help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--recursive"), "Should have recursive option");
    assert!(stdout.contains("--output"), "Should have output option");
}

#[test]
fn test_config_set_get_with_explicit_path() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("settings.toml");
    let config_arg = config.to_str().unwrap();

    let output = structrans()
        .args(["--config", config_arg, "config", "set", "translation.delay_ms", "40"])
        .output()
        .expect("Failed to run config set");
    assert!(
        output.status.success(),
        "config set should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(config.exists());

    let output = structrans()
        .args(["--config", config_arg, "config", "get", "translation.delay_ms"])
        .output()
        .expect("Failed to run config get");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("translation.delay_ms = 40"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("settings.toml");

    let output = structrans()
        .args(["--config", config.to_str().unwrap(), "config", "set", "api.model", "x"])
        .output()
        .expect("Failed to run config set");
    assert!(!output.status.success());
}

#[test]
fn test_csv_unsupported_language_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(temp_dir.path());
    let input = temp_dir.path().join("items.csv");
    let output = temp_dir.path().join("out.csv");
    fs::write(&input, "name\nWidget\n").unwrap();

    let result = structrans()
        .args([
            "--config",
            config.to_str().unwrap(),
            "csv",
            input.to_str().unwrap(),
            "--columns",
            "name",
            "--target",
            "xx",
            "-o",
            output.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run csv");

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("unsupported language code"));
    assert!(!output.exists());
}

#[test]
fn test_csv_missing_column_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(temp_dir.path());
    let input = temp_dir.path().join("items.csv");
    fs::write(&input, "name;price\nWidget;10\n").unwrap();

    let result = structrans()
        .args([
            "--config",
            config.to_str().unwrap(),
            "csv",
            input.to_str().unwrap(),
            "--columns",
            "description",
            "--target",
            "da",
        ])
        .output()
        .expect("Failed to run csv");

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("missing columns: description"));
    assert!(!temp_dir.path().join("items - Danish.csv").exists());
}

#[test]
fn test_batch_without_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let config = offline_config(temp_dir.path());
    fs::write(temp_dir.path().join("notes.txt"), "nothing here").unwrap();

    let result = structrans()
        .args([
            "--config",
            config.to_str().unwrap(),
            "batch",
            temp_dir.path().to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run batch");

    assert!(result.status.success());
    assert!(String::from_utf8_lossy(&result.stdout).contains("No CSV or XML files found"));
}
