use std::process::Command;

fn main() {
  embed_build_info();
  set_rerun_conditions();
}

/// Runs git and returns its trimmed output, or `"unknown"` when git is not
/// available or the source is not a repository.
fn git_output(args: &[&str]) -> String {
  Command::new("git")
    .args(args)
    .output()
    .ok()
    .filter(|output| output.status.success())
    .and_then(|output| String::from_utf8(output.stdout).ok())
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| "unknown".to_string())
}

fn embed_build_info() {
  // Commit hash and date shown by --version
  println!("cargo:rustc-env=GIT_HASH={}", git_output(&["rev-parse", "--short", "HEAD"]));
  println!("cargo:rustc-env=GIT_DATE={}", git_output(&["log", "-1", "--format=%cs"]));
}

fn set_rerun_conditions() {
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-changed=.git/HEAD");
}
