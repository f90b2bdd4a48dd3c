mod common;

use std::path::Path;

use chrono::{Datelike, Local};
use common::{config_for, init_git_repo, is_git_available, outcome, read_file, run, temp_dir, write_file};
use headmark::config::FeatureGate;
use headmark::processor::Processor;
use headmark::report::{Action, Outcome};

#[test]
fn test_git_ignored_files_are_not_selected() {
  if !is_git_available() {
    println!("Skipping test: git is not available");
    return;
  }

  let dir = temp_dir();
  init_git_repo(dir.path()).expect("git init");
  write_file(dir.path(), ".gitignore", "out/\n*.tmp.rs\n");
  write_file(dir.path(), "src/lib.rs", "pub fn f() {}\n");
  write_file(dir.path(), "src/scratch.tmp.rs", "fn scratch() {}\n");
  write_file(dir.path(), "out/debug/build.rs", "fn main() {}\n");

  let mut config = config_for(dir.path());
  config.git.ignore = FeatureGate::Enable;
  let report = run(&config, Action::Check);

  assert_eq!(outcome(&report, dir.path(), "src/lib.rs"), Some(Outcome::Missing));
  assert_eq!(outcome(&report, dir.path(), "src/scratch.tmp.rs"), None);
  assert_eq!(outcome(&report, dir.path(), "out/debug/build.rs"), None);

  // with git disabled the ignore rules have no effect
  config.git.ignore = FeatureGate::Disable;
  let report = run(&config, Action::Check);
  assert_eq!(outcome(&report, dir.path(), "src/scratch.tmp.rs"), Some(Outcome::Missing));
  assert_eq!(outcome(&report, dir.path(), "out/debug/build.rs"), Some(Outcome::Missing));
}

#[test]
fn test_auto_gate_uses_repository_when_present() {
  if !is_git_available() {
    println!("Skipping test: git is not available");
    return;
  }

  let dir = temp_dir();
  init_git_repo(dir.path()).expect("git init");
  write_file(dir.path(), ".gitignore", "generated.rs\n");
  write_file(dir.path(), "generated.rs", "fn generated() {}\n");
  write_file(dir.path(), "main.rs", "fn main() {}\n");

  let mut config = config_for(dir.path());
  config.git.ignore = FeatureGate::Auto;
  let report = run(&config, Action::Format);

  assert_eq!(outcome(&report, dir.path(), "main.rs"), Some(Outcome::Added));
  assert_eq!(outcome(&report, dir.path(), "generated.rs"), None);
}

#[test]
fn test_enable_gate_without_repository_fails() {
  let dir = temp_dir();
  write_file(dir.path(), "main.rs", "fn main() {}\n");

  // temp dirs normally live outside any repository
  if git2::Repository::discover(dir.path()).is_ok() {
    return;
  }

  let mut config = config_for(dir.path());
  config.git.ignore = FeatureGate::Enable;
  assert!(Processor::new(&config).is_err());
}

/// Commits `rel` with `content` as `author` at `seconds` since the epoch.
fn commit_file(repo: &git2::Repository, rel: &str, content: &str, author: &str, seconds: i64) {
  let workdir = repo.workdir().expect("workdir").to_path_buf();
  write_file(&workdir, rel, content);

  let mut index = repo.index().expect("index");
  index.add_path(Path::new(rel)).expect("add to index");
  index.write().expect("write index");
  let tree = repo.find_tree(index.write_tree().expect("write tree")).expect("find tree");

  let signature =
    git2::Signature::new(author, "dev@example.com", &git2::Time::new(seconds, 0)).expect("signature");
  let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
  let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
  repo
    .commit(Some("HEAD"), &signature, &signature, "update", &tree, &parents)
    .expect("commit");
}

#[test]
fn test_git_attrs_fill_header_properties() {
  let dir = temp_dir();
  let repo = git2::Repository::init(dir.path()).expect("git init");
  // June 2021, then June 2023
  commit_file(&repo, "src/lib.rs", "pub fn f() {}\n", "Bob", 1_622_505_600);
  commit_file(&repo, "src/lib.rs", "pub fn f() -> u8 { 1 }\n", "Alice", 1_685_577_600);
  write_file(dir.path(), "src/draft.rs", "fn draft() {}\n");

  let mut config = config_for(dir.path());
  config.inline_header = Some(
    "Copyright ${headmark.git.createdYear}-${headmark.git.modifiedYear} ${headmark.git.authors}".to_string(),
  );
  config.git.attrs = FeatureGate::Enable;

  let report = run(&config, Action::Format);
  assert_eq!(outcome(&report, dir.path(), "src/lib.rs"), Some(Outcome::Added));
  assert!(read_file(dir.path(), "src/lib.rs").contains("Copyright 2021-2023 Alice, Bob"));

  let year = Local::now().year();
  let draft = read_file(dir.path(), "src/draft.rs");
  assert!(draft.contains(&format!("Copyright {year}-{year}")), "{draft}");

  let report = run(&config, Action::Check);
  assert_eq!(outcome(&report, dir.path(), "src/lib.rs"), Some(Outcome::Present));
  assert_eq!(outcome(&report, dir.path(), "src/draft.rs"), Some(Outcome::Present));
}

#[test]
fn test_git_attrs_are_off_by_default() {
  let dir = temp_dir();
  let repo = git2::Repository::init(dir.path()).expect("git init");
  commit_file(&repo, "main.rs", "fn main() {}\n", "Bob", 1_622_505_600);

  let mut config = config_for(dir.path());
  config.inline_header = Some("Copyright ${headmark.git.createdYear}".to_string());
  run(&config, Action::Format);

  assert!(read_file(dir.path(), "main.rs").contains("Copyright ${headmark.git.createdYear}"));
}
