//! # Selection Module
//!
//! Walks the base directory and selects the files to process.
//!
//! A file is selected when it matches at least one include pattern and is not
//! excluded. A path is excluded when it matches an exclude pattern or is
//! ignored by git, unless a reversed exclude pattern (`!pattern`) matches it.
//! Excluded directories are not descended into, except when a reversed
//! pattern could match a file below them; such files are then checked one by
//! one.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::config::ConfigError;
use crate::git::IgnoreChecker;
use crate::pattern::PathPattern;

/// Include pattern used when none is configured.
pub const DEFAULT_INCLUDES: [&str; 1] = ["**"];

/// Files that never carry a license header.
pub const DEFAULT_EXCLUDES: [&str; 140] = [
  // editor backups and temporary files
  "**/*~",
  "**/#*#",
  "**/.#*",
  "**/%*%",
  "**/._*",
  "**/.repository/**",
  "**/*.lck",
  // version control
  "**/CVS",
  "**/CVS/**",
  "**/.cvsignore",
  "**/RCS",
  "**/RCS/**",
  "**/SCCS",
  "**/SCCS/**",
  "**/vssver.scc",
  "**/.svn",
  "**/.svn/**",
  "**/.arch-ids",
  "**/.arch-ids/**",
  "**/.bzr",
  "**/.bzr/**",
  "**/.MySCMServerInfo",
  "**/.DS_Store",
  ".dockerignore",
  "**/.metadata",
  "**/.metadata/**",
  "**/.hg",
  "**/.hg/**",
  "**/.hgignore",
  "**/.git",
  "**/.git/**",
  "**/.gitattributes",
  "**/.gitignore",
  "**/.gitkeep",
  "**/.gitmodules",
  "**/BitKeeper",
  "**/BitKeeper/**",
  "**/ChangeSet",
  "**/ChangeSet/**",
  "**/_darcs",
  "**/_darcs/**",
  "**/.darcsrepo",
  "**/.darcsrepo/**",
  "**/-darcs-backup*",
  "**/.darcs-temp-mail",
  // build outputs and lock files
  "**/target/**",
  "**/test-output/**",
  "**/release.properties",
  "**/dependency-reduced-pom.xml",
  "**/release-pom.xml",
  "**/pom.xml.releaseBackup",
  "**/pom.xml.versionsBackup",
  "**/node/**",
  "**/node_modules/**",
  "**/.yarn/**",
  "**/yarn.lock",
  "pnpm-lock.yaml",
  "**/go.sum",
  "**/Cargo.lock",
  // coverage data and IDE projects
  "**/cobertura.ser",
  "**/.clover/**",
  "**/jacoco.exec",
  "**/.classpath",
  "**/.project",
  "**/.settings/**",
  "**/*.iml",
  "**/*.ipr",
  "**/*.iws",
  "**/.idea/**",
  "**/nb-configuration.xml",
  "**/.factorypath",
  // descriptors and license files
  "**/MANIFEST.MF",
  "**/LICENSE",
  "**/LICENSE_HEADER",
  // binary files
  "**/*.jpg",
  "**/*.png",
  "**/*.gif",
  "**/*.ico",
  "**/*.bmp",
  "**/*.tiff",
  "**/*.tif",
  "**/*.cr2",
  "**/*.xcf",
  "**/*.class",
  "**/*.exe",
  "**/*.dll",
  "**/*.so",
  "**/*.md5",
  "**/*.sha1",
  "**/*.sha256",
  "**/*.sha512",
  "**/*.asc",
  "**/*.jks",
  "**/*.keytab",
  "**/*.lic",
  "**/*.p12",
  "**/*.pub",
  "**/*.jar",
  "**/*.zip",
  "**/*.rar",
  "**/*.tar",
  "**/*.tar.gz",
  "**/*.tar.bz2",
  "**/*.gz",
  "**/*.7z",
  // documents
  "**/META-INF/services/**",
  "**/*.md",
  "**/*.xls",
  "**/*.doc",
  "**/*.odt",
  "**/*.ods",
  "**/*.pdf",
  // CI and wrapper scripts
  "**/.travis.yml",
  "**/.appveyor.yml",
  "**/appveyor.yml",
  "**/.circleci",
  "**/.circleci/**",
  "**/.build.yml",
  "**/jvm.config",
  "**/maven.config",
  "**/gradlew",
  "**/gradlew.bat",
  "**/gradle-wrapper.properties",
  "**/mvnw",
  "**/mvnw.cmd",
  "**/maven-wrapper.properties",
  "**/MavenWrapperDownloader.java",
  // generated data
  "**/*.swf",
  "**/*.json",
  "**/*.svg",
  "**/*.eot",
  "**/*.otf",
  "**/*.ttf",
  "**/*.woff",
  "**/*.woff2",
  "**/*.log",
  "**/*.xlsx",
  "**/*.docx",
  "**/*.ppt",
  "**/*.pptx",
];

/// What to select and from where.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
  pub root: PathBuf,
  pub includes: Vec<String>,
  pub excludes: Vec<String>,
  /// Prepend [`DEFAULT_EXCLUDES`] to `excludes`.
  pub use_default_excludes: bool,
  pub case_sensitive: bool,
}

impl SelectionConfig {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      includes: Vec::new(),
      excludes: Vec::new(),
      use_default_excludes: true,
      case_sensitive: true,
    }
  }
}

/// Compiled include and exclude patterns for one tree.
#[derive(Debug, Clone)]
pub struct Selector {
  root: PathBuf,
  includes: Vec<PathPattern>,
  excludes: Vec<PathPattern>,
  reverse_excludes: Vec<PathPattern>,
}

impl Selector {
  /// Compiles the patterns of `config`.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::NegatedInclude`] if an include pattern starts
  /// with `!`.
  pub fn new(config: &SelectionConfig) -> Result<Self, ConfigError> {
    let compile = |pattern: &str| PathPattern::compile_with(pattern, config.case_sensitive);

    let includes = if config.includes.is_empty() {
      DEFAULT_INCLUDES.iter().map(|p| compile(p)).collect()
    } else {
      config
        .includes
        .iter()
        .map(|p| {
          if p.starts_with('!') {
            Err(ConfigError::NegatedInclude { pattern: p.clone() })
          } else {
            Ok(compile(p))
          }
        })
        .collect::<Result<Vec<_>, _>>()?
    };

    let defaults = config
      .use_default_excludes
      .then_some(DEFAULT_EXCLUDES.as_slice())
      .unwrap_or_default();
    let (reverse_excludes, excludes): (Vec<_>, Vec<_>) = defaults
      .iter()
      .copied()
      .chain(config.excludes.iter().map(String::as_str))
      .map(compile)
      .partition(PathPattern::is_reverse);

    Ok(Self {
      root: config.root.clone(),
      includes,
      excludes,
      reverse_excludes,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn is_included(&self, path: &str, is_dir: bool) -> bool {
    self.includes.iter().any(|p| p.matches(path, is_dir))
  }

  /// Tells if a root relative path is left out of the selection.
  ///
  /// # Parameters
  ///
  /// * `path` - Path relative to the root, with `/` separators
  /// * `is_dir` - Whether the path is a directory
  /// * `ignored` - Whether git ignores the path
  pub fn is_excluded(&self, path: &str, is_dir: bool, ignored: bool) -> bool {
    let excluded = ignored || self.excludes.iter().any(|p| p.matches(path, is_dir));
    excluded && !self.reverse_excludes.iter().any(|p| p.matches(path, is_dir))
  }

  /// Tells if a reverse exclude could keep a file below the directory `dir`.
  fn may_keep_below(&self, dir: &str) -> bool {
    self.reverse_excludes.iter().any(|p| p.may_match_below(dir))
  }

  /// Walks the root and returns the selected files.
  ///
  /// # Parameters
  ///
  /// * `ignore` - Optional git ignore lookup
  ///
  /// # Returns
  ///
  /// Root relative paths with `/` separators, in no particular order.
  pub fn select(&self, ignore: Option<&dyn IgnoreChecker>) -> Result<HashSet<String>> {
    let root = self
      .root
      .canonicalize()
      .with_context(|| format!("Failed to resolve base directory: {}", self.root.display()))?;
    debug!(
      "Selecting files under {} with {} includes, {} excludes and {} reverse excludes",
      root.display(),
      self.includes.len(),
      self.excludes.len(),
      self.reverse_excludes.len()
    );

    let mut selected = HashSet::new();
    let mut it = WalkDir::new(&root).follow_links(false).into_iter();

    while let Some(entry) = it.next() {
      let entry = entry.with_context(|| format!("Failed to traverse directory: {}", root.display()))?;
      if entry.depth() == 0 {
        continue;
      }

      let file_type = entry.file_type();
      if file_type.is_symlink() {
        trace!("Skipping symbolic link: {}", entry.path().display());
        continue;
      }

      let rel = relative_path(&root, entry.path())?;
      let is_ignored = |path: &Path| -> Result<bool> {
        match ignore {
          Some(checker) => checker.is_ignored(path),
          None => Ok(false),
        }
      };

      if file_type.is_dir() {
        if self.is_excluded(&rel, true, is_ignored(entry.path())?) {
          if self.may_keep_below(&rel) {
            trace!("Descending into excluded directory: {}", rel);
          } else {
            trace!("Pruning directory: {}", rel);
            it.skip_current_dir();
          }
        }
        continue;
      }

      if !self.is_included(&rel, false) {
        trace!("Not included: {}", rel);
        continue;
      }
      if self.is_excluded(&rel, false, is_ignored(entry.path())?) {
        trace!("Excluded: {}", rel);
        continue;
      }
      selected.insert(rel);
    }

    debug!("Selected {} files", selected.len());
    Ok(selected)
  }
}

fn relative_path(root: &Path, path: &Path) -> Result<String> {
  let rel = path
    .strip_prefix(root)
    .with_context(|| format!("{} is outside of {}", path.display(), root.display()))?;
  let segments: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
  Ok(segments.join("/"))
}
