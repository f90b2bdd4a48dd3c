mod common;

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use common::{read_file, temp_dir, write_file};
use predicates::prelude::*;

const CONFIG: &str = r#"
inlineHeader = "Copyright 2024 Acme Corp"
excludes = ["headmark.toml", "*.json", "*.csv"]

[git]
ignore = "disable"
"#;

fn headmark_cmd(dir: &Path, subcommand: &str) -> Command {
  let mut cmd = Command::cargo_bin("headmark").expect("binary should be built");
  cmd
    .current_dir(dir)
    .env_remove("HEADMARK_CONFIG")
    .env_remove("RUST_LOG")
    .arg(subcommand);
  cmd
}

fn project() -> tempfile::TempDir {
  let dir = temp_dir();
  write_file(dir.path(), "headmark.toml", CONFIG);
  write_file(dir.path(), "src/main.rs", "fn main() {}\n");
  write_file(dir.path(), "scripts/run.sh", "#!/bin/sh\necho run\n");
  dir
}

#[test]
fn test_check_format_remove_exit_codes() {
  let dir = project();

  headmark_cmd(dir.path(), "check")
    .assert()
    .failure()
    .code(1)
    .stdout(predicate::str::contains("2 files missing headers"))
    .stdout(predicate::str::contains("src/main.rs"));

  headmark_cmd(dir.path(), "format")
    .assert()
    .failure()
    .stdout(predicate::str::contains("with added headers"));
  assert!(read_file(dir.path(), "src/main.rs").starts_with("// Copyright 2024 Acme Corp\n"));

  headmark_cmd(dir.path(), "check")
    .assert()
    .success()
    .stdout(predicate::str::contains("All files have headers."));

  headmark_cmd(dir.path(), "format").assert().success();

  headmark_cmd(dir.path(), "remove")
    .args(["--fail-if-updated", "false"])
    .assert()
    .success()
    .stdout(predicate::str::contains("with removed headers"));
  assert_eq!(read_file(dir.path(), "src/main.rs"), "fn main() {}\n");
}

#[test]
fn test_check_can_ignore_missing() {
  let dir = project();
  headmark_cmd(dir.path(), "check")
    .args(["--fail-if-missing", "false"])
    .assert()
    .success();
}

#[test]
fn test_dry_run_leaves_files_untouched() {
  let dir = project();
  headmark_cmd(dir.path(), "format").arg("--dry-run").assert().failure();

  assert_eq!(read_file(dir.path(), "src/main.rs"), "fn main() {}\n");
  assert!(read_file(dir.path(), "src/main.rs.formatted").starts_with("// Copyright 2024 Acme Corp\n"));
}

#[test]
fn test_fail_if_unknown() {
  let dir = project();
  write_file(dir.path(), "data.unmapped", "data\n");

  headmark_cmd(dir.path(), "format")
    .args(["--fail-if-updated", "false"])
    .assert()
    .success();
  headmark_cmd(dir.path(), "check").assert().success();
  headmark_cmd(dir.path(), "check").arg("--fail-if-unknown").assert().failure();
}

#[test]
fn test_reports_are_written() {
  let dir = project();
  let json = dir.path().join("report.json");
  let csv = dir.path().join("report.csv");

  headmark_cmd(dir.path(), "check")
    .arg("--report-json")
    .arg(&json)
    .arg("--report-csv")
    .arg(&csv)
    .assert()
    .failure();

  let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).expect("json report")).expect("json");
  assert_eq!(report["summary"]["action"], "check");
  assert_eq!(report["summary"]["missing"], 2);
  let paths: Vec<_> = report["files"]
    .as_array()
    .expect("files")
    .iter()
    .filter_map(|f| f["path"].as_str())
    .collect();
  assert_eq!(paths, vec!["scripts/run.sh", "src/main.rs"]);

  let csv = fs::read_to_string(&csv).expect("csv report");
  assert!(csv.contains("src/main.rs,missing,"));
  assert!(csv.contains("# Summary"));
}

#[test]
fn test_explicit_config_and_env_var() {
  let dir = temp_dir();
  write_file(
    dir.path(),
    "conf/custom.toml",
    "baseDir = \"..\"\ninlineHeader = \"Copyright 2024 Acme Corp\"\nexcludes = [\"conf/**\"]\n\n[git]\nignore = \"disable\"\n",
  );
  write_file(dir.path(), "lib.rs", "pub fn f() {}\n");

  // baseDir is relative to the config file
  headmark_cmd(dir.path(), "check")
    .args(["--config", "conf/custom.toml"])
    .assert()
    .failure()
    .stdout(predicate::str::contains("lib.rs"));

  headmark_cmd(dir.path(), "check")
    .env("HEADMARK_CONFIG", dir.path().join("conf/custom.toml"))
    .assert()
    .failure()
    .stdout(predicate::str::contains("lib.rs"));

  headmark_cmd(dir.path(), "check")
    .args(["--config", "missing.toml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("missing.toml"));
}

#[test]
fn test_missing_header_source_is_an_error() {
  let dir = temp_dir();
  write_file(dir.path(), "headmark.toml", "[git]\nignore = \"disable\"\n");

  headmark_cmd(dir.path(), "check")
    .assert()
    .failure()
    .stderr(predicate::str::contains("No header configured"));
}

#[test]
fn test_color_modes() {
  let dir = project();
  let output = headmark_cmd(dir.path(), "check")
    .arg("--colors=never")
    .output()
    .expect("run");
  assert!(!String::from_utf8_lossy(&output.stdout).contains("\x1b["));

  // auto mode with non-TTY output
  let output = headmark_cmd(dir.path(), "check").output().expect("run");
  assert!(!String::from_utf8_lossy(&output.stdout).contains("\x1b["));

  let output = headmark_cmd(dir.path(), "check")
    .arg("--colors=always")
    .output()
    .expect("run");
  assert!(String::from_utf8_lossy(&output.stdout).contains("\x1b["));
}

#[test]
fn test_quiet_prints_only_paths() {
  let dir = project();
  headmark_cmd(dir.path(), "check")
    .arg("-q")
    .assert()
    .failure()
    .stdout(predicate::eq("scripts/run.sh\nsrc/main.rs\n"));
}

#[test]
fn test_version_and_help() {
  Command::cargo_bin("headmark")
    .expect("binary should be built")
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("headmark"));

  Command::cargo_bin("headmark")
    .expect("binary should be built")
    .args(["check", "--help"])
    .assert()
    .success()
    .stdout(predicate::str::contains("--fail-if-missing"));
}
