//! Integration tests for configuration layering.
//!
//! Tests the priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use photo_sieve_test_support::{write_zero_model, SyntheticImageBuilder};
use predicates::prelude::*;
use tempfile::TempDir;

/// Temp home with a one-image library and a zero model (every score is 0.5).
fn setup() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    let image = home.path().join("library/Camera/a.png");
    fs::create_dir_all(image.parent().unwrap()).unwrap();
    SyntheticImageBuilder::save(&SyntheticImageBuilder::solid(16, 16, [90, 90, 90]), &image)
        .unwrap();
    write_zero_model(model(home.path())).unwrap();
    home
}

fn model(home: &Path) -> PathBuf {
    home.join("sieve.safetensors")
}

fn command(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("photo-sieve").unwrap();
    cmd.current_dir(home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("PHOTO_SIEVE_DATA_DIR", home.join("data"));
    cmd
}

fn write_project_config(home: &Path, toml: &str) {
    fs::write(home.join(".photo-sieve.toml"), toml).unwrap();
}

fn write_xdg_config(home: &Path, toml: &str) {
    let dir = home.join("config").join("photo-sieve");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), toml).unwrap();
}

#[test]
fn test_project_config_supplies_library_and_model() {
    let home = setup();
    write_project_config(
        home.path(),
        &format!(
            "[general]\nlibrary = '{}'\n\n[model]\npath = '{}'\n",
            home.path().join("library").display(),
            model(home.path()).display()
        ),
    );

    command(home.path()).arg("scan").assert().code(1);
}

#[test]
fn test_project_config_threshold_applies() {
    let home = setup();
    write_project_config(home.path(), "[model]\nthreshold = 0.6\n");

    command(home.path())
        .arg("scan")
        .arg("--library")
        .arg(home.path().join("library"))
        .arg("--model")
        .arg(model(home.path()))
        .assert()
        .code(0);
}

#[test]
fn test_cli_threshold_overrides_project_config() {
    let home = setup();
    write_project_config(home.path(), "[model]\nthreshold = 0.6\n");

    command(home.path())
        .arg("scan")
        .arg("--library")
        .arg(home.path().join("library"))
        .arg("--model")
        .arg(model(home.path()))
        .args(["--threshold", "0.5"])
        .assert()
        .code(1);
}

#[test]
fn test_project_config_overrides_xdg_config() {
    let home = setup();
    write_xdg_config(home.path(), "[model]\nthreshold = 0.6\n");
    write_project_config(home.path(), "[model]\nthreshold = 0.4\n");

    command(home.path())
        .arg("scan")
        .arg("--library")
        .arg(home.path().join("library"))
        .arg("--model")
        .arg(model(home.path()))
        .assert()
        .code(1);
}

#[test]
fn test_xdg_config_applies_format() {
    let home = setup();
    write_xdg_config(home.path(), "[output]\nformat = 'json'\n");

    command(home.path())
        .arg("scan")
        .arg("--library")
        .arg(home.path().join("library"))
        .arg("--model")
        .arg(model(home.path()))
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_invalid_config_value_warns() {
    let home = setup();
    write_project_config(home.path(), "[model]\nthreshold = 3.0\n");

    command(home.path())
        .arg("scan")
        .arg("--library")
        .arg(home.path().join("library"))
        .arg("--model")
        .arg(model(home.path()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("warning: model.threshold"));
}

#[test]
fn test_malformed_config_is_ignored() {
    let home = setup();
    write_project_config(home.path(), "[model\nthreshold = ");

    command(home.path())
        .arg("scan")
        .arg("--library")
        .arg(home.path().join("library"))
        .arg("--model")
        .arg(model(home.path()))
        .assert()
        .code(1);
}
