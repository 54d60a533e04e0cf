//! End-to-end scan tests with small generated classifier weights.
//!
//! A zero-weights model scores every image exactly 0.5, so the default
//! threshold detects everything and a threshold above 0.5 detects nothing.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use photo_sieve_test_support::{write_constant_model, write_zero_model, SyntheticImageBuilder};
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    home: TempDir,
}

impl Env {
    /// Library with two Camera images and one Screenshot, plus a zero model.
    fn new() -> Self {
        let home = tempfile::tempdir().unwrap();
        let env = Self { home };
        env.add_image("Camera/a.png", [200, 10, 10]);
        env.add_image("Camera/b.png", [10, 200, 10]);
        env.add_image("Screenshots/c.png", [10, 10, 200]);
        write_zero_model(env.model()).unwrap();
        env
    }

    fn add_image(&self, relative: &str, rgb: [u8; 3]) {
        let path = self.library().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        SyntheticImageBuilder::save(&SyntheticImageBuilder::solid(32, 24, rgb), &path).unwrap();
    }

    fn library(&self) -> PathBuf {
        self.home.path().join("library")
    }

    fn model(&self) -> PathBuf {
        self.home.path().join("sieve.safetensors")
    }

    fn scan(&self) -> Command {
        let mut cmd = Command::cargo_bin("photo-sieve").unwrap();
        cmd.current_dir(self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join("config"))
            .env("PHOTO_SIEVE_DATA_DIR", self.home.path().join("data"))
            .arg("scan")
            .arg("--library")
            .arg(self.library())
            .arg("--model")
            .arg(self.model());
        cmd
    }
}

fn jsonl(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8(stdout.to_vec())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_default_threshold_detects_everything() {
    let env = Env::new();
    let output = env.scan().assert().code(1).get_output().stdout.clone();

    let detections = jsonl(&output);
    assert_eq!(detections.len(), 3);
    for d in &detections {
        assert_eq!(d["score"], 0.5);
        assert!(d["timestamp"].is_string());
    }
}

#[test]
fn test_higher_threshold_detects_nothing() {
    let env = Env::new();
    env.scan()
        .args(["--threshold", "0.6"])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No candidates found"));
}

#[test]
fn test_polarity_below() {
    let env = Env::new();
    env.scan()
        .args(["--threshold", "0.6", "--polarity", "below"])
        .assert()
        .code(1);
}

#[test]
fn test_negative_bias_detects_nothing() {
    let env = Env::new();
    write_constant_model(env.model(), -4.0).unwrap();
    env.scan().assert().code(0);
}

#[test]
fn test_album_filter() {
    let env = Env::new();
    let output = env
        .scan()
        .args(["--album", "Camera"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let ids: Vec<_> = jsonl(&output)
        .iter()
        .map(|d| d["image"]["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|id| id.starts_with("Camera/")));
}

#[test]
fn test_json_array_format() {
    let env = Env::new();
    env.scan()
        .args(["--format", "json"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_larger_input_size() {
    let env = Env::new();
    env.scan().args(["--input-size", "512"]).assert().code(1);
}

#[test]
fn test_undecodable_file_is_not_detected() {
    let env = Env::new();
    fs::write(env.library().join("Camera/broken.jpg"), b"not a jpeg").unwrap();

    let output = env.scan().assert().code(1).get_output().stdout.clone();
    let detections = jsonl(&output);
    assert_eq!(detections.len(), 3);
    assert!(detections
        .iter()
        .all(|d| d["image"]["id"] != "Camera/broken.jpg"));
}

#[test]
fn test_scan_and_export() {
    let env = Env::new();
    let out = env.home.path().join("out");
    fs::create_dir(&out).unwrap();

    env.scan()
        .args(["--format", "json", "--export", "--dest"])
        .arg(&out)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Copied 3 of 3 images to"));

    for (name, source) in [
        ("a.png", "Camera/a.png"),
        ("b.png", "Camera/b.png"),
        ("c.png", "Screenshots/c.png"),
    ] {
        assert_eq!(
            fs::read(out.join(name)).unwrap(),
            fs::read(env.library().join(source)).unwrap()
        );
    }
}

#[test]
fn test_export_without_destination_fails_before_scanning() {
    let env = Env::new();
    env.scan()
        .arg("--export")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Destination folder not found"));
}

#[test]
fn test_model_from_data_dir() {
    let env = Env::new();
    let models = env.home.path().join("data").join("models");
    fs::create_dir_all(&models).unwrap();
    write_zero_model(models.join("sieve.safetensors")).unwrap();

    let mut cmd = Command::cargo_bin("photo-sieve").unwrap();
    cmd.current_dir(env.home.path())
        .env("XDG_CONFIG_HOME", env.home.path().join("config"))
        .env("PHOTO_SIEVE_DATA_DIR", env.home.path().join("data"))
        .arg("scan")
        .arg("--library")
        .arg(env.library())
        .assert()
        .code(1);
}

fn ids(stdout: &[u8]) -> Vec<String> {
    jsonl(stdout)
        .iter()
        .map(|d| d["image"]["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_stop_line_keeps_detections_so_far() {
    let env = Env::new();
    for i in 0..57 {
        env.add_image(&format!("Bulk/{i:02}.png"), [i * 4, 80, 120]);
    }

    let full = env.scan().assert().code(1).get_output().stdout.clone();
    let full = ids(&full);
    assert_eq!(full.len(), 60);

    let stopped = env.scan().write_stdin("stop\n").assert().get_output().clone();
    let stderr = String::from_utf8(stopped.stderr).unwrap();
    assert!(stderr.contains("(cancelled)"), "stderr: {stderr}");

    let partial = ids(&stopped.stdout);
    assert!(partial.len() < full.len());
    assert_eq!(partial, full[..partial.len()]);
    assert!(stderr.contains(&format!("Scanned {} of 60 image(s)", partial.len())));
    let expected_code = if partial.is_empty() { 0 } else { 1 };
    assert_eq!(stopped.status.code(), Some(expected_code));
}
