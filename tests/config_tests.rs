//! Integration tests for configuration validation through the binary.

use std::io::Write;
use tempfile::NamedTempFile;

/// Helper to get the binary path
fn binary_path() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_herakles-disk-check"))
}

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_default_config_is_valid() {
    let output = std::process::Command::new(binary_path())
        .args(["--no-config", "--check-config"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid"));
}

#[test]
fn test_two_instances_rejected() {
    let file = config_file(
        ".yaml",
        "instances:\n  - use_mount: yes\n  - use_mount: no\n",
    );

    let output = std::process::Command::new(binary_path())
        .arg("--config")
        .arg(file.path())
        .arg("--check-config")
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(
        stderr.contains("Disk check only supports one configured instance (got 2)"),
        "Expected instance count error, got stderr: '{}'",
        stderr
    );
}

#[test]
fn test_invalid_regex_rejected() {
    let file = config_file(".yaml", "instances:\n  - excluded_disk_re: '(['\n");

    let output = std::process::Command::new(binary_path())
        .arg("--config")
        .arg(file.path())
        .arg("--check-config")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Configuration invalid"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let output = std::process::Command::new(binary_path())
        .args(["--config", "/nonexistent/herakles-disk-check.yaml", "--check-config"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
}

#[test]
fn test_show_config_applies_cli_overrides() {
    let file = config_file(".toml", "port = 9100\nsource = \"df\"\n");

    let output = std::process::Command::new(binary_path())
        .arg("--config")
        .arg(file.path())
        .args(["--port", "9300", "--show-config", "--config-format", "json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let shown: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("show-config prints JSON");
    assert_eq!(shown["port"], 9300);
    assert_eq!(shown["source"], "df");
}
