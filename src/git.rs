//! # Git Module
//!
//! This module answers whether git ignores a path, so that ignored files can
//! be left out of the selection. The lookup sits behind the [`IgnoreChecker`]
//! trait; [`GitIgnoreChecker`] implements it with `git2`.
//!
//! It also collects the commit history of the working tree into a
//! [`GitHistory`], which supplies the `headmark.git.*` header properties.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Datelike, FixedOffset, Local};
use git2::{Commit, Repository};
use tracing::{debug, info, trace};

use crate::config::FeatureGate;
use crate::verbose_log;

/// Year of the oldest commit touching the file.
pub const CREATED_YEAR_PROPERTY: &str = "headmark.git.createdYear";
/// Year of the newest commit touching the file.
pub const MODIFIED_YEAR_PROPERTY: &str = "headmark.git.modifiedYear";
/// Sorted, comma separated names of the commit authors of the file.
pub const AUTHORS_PROPERTY: &str = "headmark.git.authors";

/// Tells whether a path is ignored by version control.
pub trait IgnoreChecker {
  /// # Errors
  ///
  /// Returns an error when the path cannot be evaluated, e.g. because it is
  /// outside of the repository.
  fn is_ignored(&self, path: &Path) -> Result<bool>;
}

/// [`IgnoreChecker`] backed by the `.gitignore` rules of a repository.
pub struct GitIgnoreChecker {
  repo: Repository,
  workdir: PathBuf,
}

impl GitIgnoreChecker {
  /// Opens the repository enclosing `base_dir`.
  ///
  /// # Errors
  ///
  /// Returns an error if no repository is found or the repository is bare.
  pub fn discover(base_dir: &Path) -> Result<Self> {
    let (repo, workdir) = open_repository(base_dir)?;
    verbose_log!("Using git repository at {}", workdir.display());
    Ok(Self { repo, workdir })
  }

  pub fn workdir(&self) -> &Path {
    &self.workdir
  }
}

impl IgnoreChecker for GitIgnoreChecker {
  fn is_ignored(&self, path: &Path) -> Result<bool> {
    let absolute = if path.is_absolute() {
      path.to_path_buf()
    } else {
      std::env::current_dir()
        .context("Failed to get current directory")?
        .join(path)
    };
    let relative = absolute
      .strip_prefix(&self.workdir)
      .with_context(|| format!("{} is outside of the git working directory", path.display()))?;

    if relative.as_os_str().is_empty() {
      return Ok(false);
    }

    // libgit2 treats a trailing slash as a directory
    let mut candidate = relative.to_string_lossy().replace('\\', "/");
    if absolute.is_dir() {
      candidate.push('/');
    }

    self
      .repo
      .is_path_ignored(&candidate)
      .with_context(|| format!("Failed to check git ignore rules for {}", path.display()))
  }
}

/// Builds the ignore checker selected by `gate`.
///
/// # Parameters
///
/// * `base_dir` - Directory the selection starts from
/// * `gate` - `auto` uses git when a repository is found, `enable` requires it
///
/// # Returns
///
/// The checker, or `None` when git ignore rules are not used.
pub fn resolve_ignore_checker(base_dir: &Path, gate: FeatureGate) -> Result<Option<Box<dyn IgnoreChecker>>> {
  match gate {
    FeatureGate::Disable => {
      debug!("git ignore support is disabled");
      Ok(None)
    }
    FeatureGate::Auto => match GitIgnoreChecker::discover(base_dir) {
      Ok(checker) => {
        info!("git ignore support is resolved to enabled");
        Ok(Some(Box::new(checker)))
      }
      Err(e) => {
        info!("git ignore support is resolved to disabled: {:#}", e);
        Ok(None)
      }
    },
    FeatureGate::Enable => {
      let checker = GitIgnoreChecker::discover(base_dir).context("git ignore support is enabled")?;
      Ok(Some(Box::new(checker)))
    }
  }
}

/// Commit history facts about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitFileAttrs {
  pub created: DateTime<FixedOffset>,
  pub modified: DateTime<FixedOffset>,
  pub authors: BTreeSet<String>,
}

impl GitFileAttrs {
  fn new(time: DateTime<FixedOffset>, author: String) -> Self {
    Self {
      created: time,
      modified: time,
      authors: BTreeSet::from([author]),
    }
  }

  fn record(&mut self, time: DateTime<FixedOffset>, author: String) {
    self.created = self.created.min(time);
    self.modified = self.modified.max(time);
    self.authors.insert(author);
  }
}

/// Commit history of the files in a working tree, keyed by absolute path.
#[derive(Debug, Default, Clone)]
pub struct GitHistory {
  files: HashMap<PathBuf, GitFileAttrs>,
}

impl GitHistory {
  /// Walks every commit reachable from `HEAD`.
  ///
  /// Each commit is diffed against its first parent, or against the empty
  /// tree for a root commit, and credited to the files the diff touches.
  ///
  /// # Errors
  ///
  /// Returns an error when the object database cannot be read.
  pub fn collect(repo: &Repository, workdir: &Path) -> Result<Self> {
    let mut history = Self::default();
    if repo.is_empty().context("Failed to inspect git repository")? {
      debug!("git repository has no commits");
      return Ok(history);
    }

    let mut revwalk = repo.revwalk().context("Failed to walk git history")?;
    revwalk.push_head().context("Failed to resolve git HEAD")?;

    let mut commits = 0usize;
    for oid in revwalk {
      let commit = repo.find_commit(oid?)?;
      let time = commit_time(&commit)?;
      let author = String::from_utf8_lossy(commit.author().name_bytes()).into_owned();

      let tree = commit.tree()?;
      let parent_tree = match commit.parent_count() {
        0 => None,
        _ => Some(commit.parent(0)?.tree()?),
      };
      let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

      for delta in diff.deltas() {
        if let Some(path) = delta.new_file().path() {
          history.record(workdir.join(path), time, &author);
        }
      }
      commits += 1;
    }

    verbose_log!("Collected git history of {} files from {} commits", history.files.len(), commits);
    Ok(history)
  }

  fn record(&mut self, path: PathBuf, time: DateTime<FixedOffset>, author: &str) {
    match self.files.get_mut(&path) {
      Some(attrs) => attrs.record(time, author.to_string()),
      None => {
        self.files.insert(path, GitFileAttrs::new(time, author.to_string()));
      }
    }
  }

  /// History of `path`, which must be absolute and canonical.
  pub fn get(&self, path: &Path) -> Option<&GitFileAttrs> {
    self.files.get(path)
  }

  /// Header properties of `path`.
  ///
  /// A file without history has not been committed yet, so both years are the
  /// current year and the authors are left empty.
  pub fn properties(&self, path: &Path) -> Vec<(&'static str, String)> {
    match self.get(path) {
      Some(attrs) => vec![
        (CREATED_YEAR_PROPERTY, attrs.created.year().to_string()),
        (MODIFIED_YEAR_PROPERTY, attrs.modified.year().to_string()),
        (AUTHORS_PROPERTY, attrs.authors.iter().cloned().collect::<Vec<_>>().join(", ")),
      ],
      None => {
        trace!("No git history for {}", path.display());
        let year = Local::now().year().to_string();
        vec![
          (CREATED_YEAR_PROPERTY, year.clone()),
          (MODIFIED_YEAR_PROPERTY, year),
          (AUTHORS_PROPERTY, String::new()),
        ]
      }
    }
  }
}

fn commit_time(commit: &Commit<'_>) -> Result<DateTime<FixedOffset>> {
  let time = commit.time();
  let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
    .ok_or_else(|| anyhow!("Invalid timezone offset on commit {}", commit.id()))?;
  let utc = DateTime::from_timestamp(time.seconds(), 0)
    .ok_or_else(|| anyhow!("Invalid timestamp on commit {}", commit.id()))?;
  Ok(utc.with_timezone(&offset))
}

/// Collects the git history selected by `gate`.
///
/// # Returns
///
/// The history, or `None` when git attributes are not used.
pub fn resolve_git_history(base_dir: &Path, gate: FeatureGate) -> Result<Option<GitHistory>> {
  match gate {
    FeatureGate::Disable => {
      debug!("git attrs support is disabled");
      Ok(None)
    }
    FeatureGate::Auto => match open_repository(base_dir) {
      Ok((repo, workdir)) => {
        info!("git attrs support is resolved to enabled");
        Ok(Some(GitHistory::collect(&repo, &workdir)?))
      }
      Err(e) => {
        info!("git attrs support is resolved to disabled: {:#}", e);
        Ok(None)
      }
    },
    FeatureGate::Enable => {
      let (repo, workdir) = open_repository(base_dir).context("git attrs support is enabled")?;
      Ok(Some(GitHistory::collect(&repo, &workdir)?))
    }
  }
}

fn open_repository(base_dir: &Path) -> Result<(Repository, PathBuf)> {
  let repo = Repository::discover(base_dir)
    .with_context(|| format!("Failed to discover git repository from {}", base_dir.display()))?;
  let workdir = repo
    .workdir()
    .ok_or_else(|| anyhow!("Bare git repository has no working directory"))?
    .canonicalize()
    .context("Failed to resolve git working directory")?;
  Ok((repo, workdir))
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  fn repo_with_ignore(rules: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    Repository::init(dir.path()).expect("git init");
    fs::write(dir.path().join(".gitignore"), rules).expect("write .gitignore");
    dir
  }

  #[test]
  fn test_ignored_files_and_directories() {
    let dir = repo_with_ignore("*.log\nbuild/\n");
    fs::write(dir.path().join("app.log"), "log").expect("write");
    fs::write(dir.path().join("main.rs"), "fn main() {}").expect("write");
    fs::create_dir(dir.path().join("build")).expect("mkdir");

    let checker = GitIgnoreChecker::discover(dir.path()).expect("discover");
    let root = checker.workdir().to_path_buf();
    assert!(checker.is_ignored(&root.join("app.log")).expect("check"));
    assert!(!checker.is_ignored(&root.join("main.rs")).expect("check"));
    assert!(checker.is_ignored(&root.join("build")).expect("check"));
  }

  #[test]
  fn test_path_outside_repository_is_an_error() {
    let dir = repo_with_ignore("");
    let other = TempDir::new().expect("tempdir");
    let checker = GitIgnoreChecker::discover(dir.path()).expect("discover");
    let outside = other.path().canonicalize().expect("canonicalize").join("file.rs");
    assert!(checker.is_ignored(&outside).is_err());
  }

  #[test]
  fn test_gate_without_repository() {
    let dir = TempDir::new().expect("tempdir");
    let disabled = resolve_ignore_checker(dir.path(), FeatureGate::Disable).expect("disable");
    assert!(disabled.is_none());

    // temp dirs normally live outside any repository
    if Repository::discover(dir.path()).is_err() {
      let auto = resolve_ignore_checker(dir.path(), FeatureGate::Auto).expect("auto");
      assert!(auto.is_none());
      assert!(resolve_ignore_checker(dir.path(), FeatureGate::Enable).is_err());
    }
  }

  #[test]
  fn test_gate_with_repository() {
    let dir = repo_with_ignore("");
    let auto = resolve_ignore_checker(dir.path(), FeatureGate::Auto).expect("auto");
    assert!(auto.is_some());
    let enabled = resolve_ignore_checker(dir.path(), FeatureGate::Enable).expect("enable");
    assert!(enabled.is_some());
  }

  const JUNE_2021: i64 = 1_622_505_600;
  const JUNE_2022: i64 = 1_654_041_600;
  const JUNE_2023: i64 = 1_685_577_600;

  fn commit(repo: &Repository, rel: &str, content: &str, author: &str, seconds: i64) {
    let workdir = repo.workdir().expect("workdir").to_path_buf();
    fs::write(workdir.join(rel), content).expect("write");

    let mut index = repo.index().expect("index");
    index.add_path(Path::new(rel)).expect("add");
    index.write().expect("write index");
    let tree = repo.find_tree(index.write_tree().expect("write tree")).expect("tree");

    let signature = git2::Signature::new(author, "dev@example.com", &git2::Time::new(seconds, 0)).expect("signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo
      .commit(Some("HEAD"), &signature, &signature, "change", &tree, &parents)
      .expect("commit");
  }

  #[test]
  fn test_history_tracks_years_and_authors() {
    let dir = TempDir::new().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("git init");
    commit(&repo, "a.rs", "fn a() {}\n", "Bob", JUNE_2021);
    commit(&repo, "b.rs", "fn b() {}\n", "Bob", JUNE_2022);
    commit(&repo, "a.rs", "fn a() { b() }\n", "Alice", JUNE_2023);

    let (repo, workdir) = open_repository(dir.path()).expect("open");
    let history = GitHistory::collect(&repo, &workdir).expect("collect");

    let a = history.get(&workdir.join("a.rs")).expect("a.rs history");
    assert_eq!(a.created.year(), 2021);
    assert_eq!(a.modified.year(), 2023);
    assert_eq!(a.authors, BTreeSet::from(["Alice".to_string(), "Bob".to_string()]));

    let props = history.properties(&workdir.join("a.rs"));
    assert_eq!(
      props,
      vec![
        (CREATED_YEAR_PROPERTY, "2021".to_string()),
        (MODIFIED_YEAR_PROPERTY, "2023".to_string()),
        (AUTHORS_PROPERTY, "Alice, Bob".to_string()),
      ]
    );

    let b = history.get(&workdir.join("b.rs")).expect("b.rs history");
    assert_eq!((b.created.year(), b.modified.year()), (2022, 2022));
    assert_eq!(b.authors.len(), 1);
  }

  #[test]
  fn test_uncommitted_file_uses_current_year() {
    let dir = TempDir::new().expect("tempdir");
    let repo = Repository::init(dir.path()).expect("git init");
    commit(&repo, "a.rs", "fn a() {}\n", "Bob", JUNE_2021);

    let (repo, workdir) = open_repository(dir.path()).expect("open");
    let history = GitHistory::collect(&repo, &workdir).expect("collect");

    let year = Local::now().year().to_string();
    let props = history.properties(&workdir.join("new.rs"));
    assert_eq!(props[0], (CREATED_YEAR_PROPERTY, year.clone()));
    assert_eq!(props[1], (MODIFIED_YEAR_PROPERTY, year));
    assert_eq!(props[2], (AUTHORS_PROPERTY, String::new()));
  }

  #[test]
  fn test_history_of_repository_without_commits() {
    let dir = repo_with_ignore("");
    let history = resolve_git_history(dir.path(), FeatureGate::Enable)
      .expect("enable")
      .expect("history");
    let workdir = dir.path().canonicalize().expect("canonicalize");
    assert!(history.get(&workdir.join(".gitignore")).is_none());
  }

  #[test]
  fn test_history_gate_without_repository() {
    let dir = TempDir::new().expect("tempdir");
    assert!(resolve_git_history(dir.path(), FeatureGate::Disable).expect("disable").is_none());

    // temp dirs normally live outside any repository
    if Repository::discover(dir.path()).is_err() {
      assert!(resolve_git_history(dir.path(), FeatureGate::Auto).expect("auto").is_none());
      assert!(resolve_git_history(dir.path(), FeatureGate::Enable).is_err());
    }
  }
}
