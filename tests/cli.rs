//! Behavioural tests for the `berry` binary.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn export_schema_prints_sdl() {
    let mut cmd = Command::cargo_bin("berry").expect("binary");
    cmd.arg("export-schema");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("type Query"))
        .stdout(predicate::str::contains("readText(textFile: Upload!): String!"))
        .stdout(predicate::str::contains("input FolderInput"));
}

#[test]
fn invalid_config_file_reports_configuration_error() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(".berry.toml");
    std::fs::write(&path, "not = [valid").expect("write broken config");

    let mut cmd = Command::cargo_bin("berry").expect("binary");
    cmd.env("BERRY_CONFIG_PATH", &path)
        .args(["serve", "--port", "0"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn unknown_subcommand_fails() {
    let mut cmd = Command::cargo_bin("berry").expect("binary");
    cmd.arg("frobnicate");
    cmd.assert().failure();
}
