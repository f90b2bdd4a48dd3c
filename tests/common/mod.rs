#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use headmark::config::{Config, FeatureGate};
use headmark::processor::Processor;
use headmark::report::{Action, Outcome, Report};
use tempfile::TempDir;

/// Header used by most tests.
pub const HEADER: &str = "Copyright 2024 Acme Corp\nLicensed under the MIT License.";

/// Checks if git is available on the system.
pub fn is_git_available() -> bool {
  Command::new("git").arg("--version").status().is_ok()
}

/// Runs a git command in the given directory, returning an error with stderr on
/// failure.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
  let output = Command::new("git")
    .args(args)
    .current_dir(dir)
    .output()
    .with_context(|| format!("Failed to execute git {:?}", args))?;

  if !output.status.success() {
    anyhow::bail!("git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
  }
  Ok(())
}

/// Initializes a git repository in the given directory with deterministic
/// settings.
pub fn init_git_repo(dir: &Path) -> Result<()> {
  run_git(dir, &["init"])?;
  run_git(dir, &["config", "user.name", "Test User"])?;
  run_git(dir, &["config", "user.email", "test@example.com"])?;
  run_git(dir, &["config", "commit.gpgsign", "false"])?;
  Ok(())
}

/// Writes `content` to `rel` below `dir`, creating parent directories.
pub fn write_file(dir: &Path, rel: &str, content: &str) -> PathBuf {
  let path = dir.join(rel);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).expect("create parent directories");
  }
  fs::write(&path, content).expect("write test file");
  path
}

pub fn read_file(dir: &Path, rel: &str) -> String {
  fs::read_to_string(dir.join(rel)).expect("read test file")
}

/// Canonical path of `rel` below `dir`, as used for report keys.
pub fn key(dir: &Path, rel: &str) -> PathBuf {
  dir.join(rel).canonicalize().expect("canonicalize test path")
}

/// A config rooted at `dir` with an inline [`HEADER`] and git support off.
pub fn config_for(dir: &Path) -> Config {
  let mut config = Config::default();
  config.resolve_paths(dir);
  config.inline_header = Some(HEADER.to_string());
  config.git.ignore = FeatureGate::Disable;
  config.threads = Some(2);
  config
}

/// Runs `action` over `dir` with `config`.
pub fn run(config: &Config, action: Action) -> Report {
  Processor::new(config)
    .expect("processor should build")
    .run(action)
    .expect("run should succeed")
}

/// The outcome recorded for `rel`.
pub fn outcome(report: &Report, dir: &Path, rel: &str) -> Option<Outcome> {
  report.get(&key(dir, rel))
}

pub fn temp_dir() -> TempDir {
  TempDir::new().expect("create temp dir")
}
