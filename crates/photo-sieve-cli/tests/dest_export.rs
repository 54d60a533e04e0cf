//! Destination folder and export command tests.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use photo_sieve_test_support::SyntheticImageBuilder;
use predicates::prelude::*;

fn command(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("photo-sieve").unwrap();
    cmd.current_dir(home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("PHOTO_SIEVE_DATA_DIR", home.join("data"));
    cmd
}

fn write_image(path: &Path, rgb: [u8; 3]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    SyntheticImageBuilder::save(&SyntheticImageBuilder::solid(8, 8, rgb), path).unwrap();
}

fn make_dir(home: &Path, name: &str) -> PathBuf {
    let dir = home.join(name);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_dest_show_when_unset() {
    let home = tempfile::tempdir().unwrap();
    command(home.path())
        .args(["dest", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No destination folder set"));
}

#[test]
fn test_dest_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    let out = make_dir(home.path(), "out").canonicalize().unwrap();

    command(home.path())
        .args(["dest", "set"])
        .arg(&out)
        .assert()
        .success();
    assert!(home.path().join("data").join("prefs.toml").exists());

    command(home.path())
        .args(["dest", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(out.to_string_lossy().as_ref()));
}

#[test]
fn test_dest_reselect_overwrites() {
    let home = tempfile::tempdir().unwrap();
    let first = make_dir(home.path(), "first");
    let second = make_dir(home.path(), "second").canonicalize().unwrap();

    command(home.path()).args(["dest", "set"]).arg(&first).assert().success();
    command(home.path()).args(["dest", "set"]).arg(&second).assert().success();

    command(home.path())
        .args(["dest", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second").and(predicate::str::contains("first").not()));
}

#[test]
fn test_dest_set_missing_folder_fails() {
    let home = tempfile::tempdir().unwrap();
    command(home.path())
        .args(["dest", "set", "does-not-exist"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Destination folder not found"));
}

#[test]
fn test_export_without_destination_fails() {
    let home = tempfile::tempdir().unwrap();
    let image = home.path().join("a.png");
    write_image(&image, [1, 2, 3]);

    command(home.path())
        .arg("export")
        .arg(&image)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Destination folder not found!"));
}

#[test]
fn test_export_copies_files() {
    let home = tempfile::tempdir().unwrap();
    let out = make_dir(home.path(), "out");
    let a = home.path().join("photos/a.png");
    let b = home.path().join("photos/b.png");
    write_image(&a, [1, 2, 3]);
    write_image(&b, [4, 5, 6]);

    command(home.path())
        .arg("export")
        .arg(&a)
        .arg(&b)
        .arg("--dest")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied 2 of 2 images to"));

    assert_eq!(fs::read(out.join("a.png")).unwrap(), fs::read(&a).unwrap());
    assert_eq!(fs::read(out.join("b.png")).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn test_export_relative_paths_and_saved_destination() {
    let home = tempfile::tempdir().unwrap();
    let out = make_dir(home.path(), "out");
    write_image(&home.path().join("photos/a.png"), [7, 8, 9]);

    command(home.path()).args(["dest", "set"]).arg(&out).assert().success();
    command(home.path())
        .args(["export", "photos/a.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied 1 of 1 images to"));

    assert!(out.join("a.png").exists());
}

#[test]
fn test_export_never_overwrites() {
    let home = tempfile::tempdir().unwrap();
    let out = make_dir(home.path(), "out");
    fs::write(out.join("a.png"), b"keep me").unwrap();
    let a = home.path().join("a.png");
    write_image(&a, [1, 1, 1]);

    command(home.path())
        .arg("export")
        .arg(&a)
        .arg("--dest")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read(out.join("a.png")).unwrap(), b"keep me");
    assert_eq!(fs::read(out.join("a (1).png")).unwrap(), fs::read(&a).unwrap());
}

#[test]
fn test_export_partial_failure() {
    let home = tempfile::tempdir().unwrap();
    let out = make_dir(home.path(), "out");
    let a = home.path().join("a.png");
    write_image(&a, [1, 1, 1]);

    command(home.path())
        .arg("export")
        .arg(&a)
        .arg(home.path().join("missing.png"))
        .arg("--dest")
        .arg(&out)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Copied 1 of 2 images to"));
}
