//! # Processor Module
//!
//! This module runs an [`Action`] over every selected file and collects the
//! outcomes into a [`Report`].
//!
//! The module is organized into:
//! - [`file_io`] - File reading and writing operations
//!
//! The [`Processor`] is built once from a [`Config`]. Building it loads the
//! header styles, the mapping, the header template, the ignore checker and
//! the git history, so every configuration error surfaces before any file is
//! touched.

mod file_io;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
pub use file_io::{FORMATTED_SUFFIX, FileIO, REMOVED_SUFFIX};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::config::{Config, ConfigError};
use crate::document::{DocumentFactory, MappingTable};
use crate::git::{IgnoreChecker, resolve_git_history, resolve_ignore_checker};
use crate::header::style::{StyleRegistry, parse_styles};
use crate::header::template::HeaderContent;
use crate::report::{Action, Outcome, Report};
use crate::resource::{Location, ResourceFinder};
use crate::selection::{SelectionConfig, Selector};
use crate::verbose_log;

/// Per-file work shared by the worker threads.
struct FileProcessor {
  factory: DocumentFactory,
  header: HeaderContent,
  /// Canonical path of the header template, when it is a file.
  header_file: Option<PathBuf>,
  strict_check: bool,
  dry_run: bool,
}

impl FileProcessor {
  fn process(&self, path: &Path, action: Action) -> Result<Outcome> {
    // unmapped files are never read
    if self.factory.style_for(path).is_unknown() {
      trace!("No header style for {}", path.display());
      return Ok(Outcome::Unknown);
    }
    let Some(text) = FileIO::read_text(path)? else {
      trace!("Not a UTF-8 text file: {}", path.display());
      return Ok(Outcome::Unknown);
    };
    let Some(mut document) = self.factory.create_document(path, &text) else {
      return Ok(Outcome::Unknown);
    };

    let passes = document.existing_header() && document.header_matches(&self.header, self.strict_check)?;

    let outcome = match action {
      Action::Check if passes => Outcome::Present,
      Action::Check => Outcome::Missing,
      Action::Format if passes => Outcome::Noop,
      Action::Format => {
        let outcome = if document.header_detected() {
          document.remove_header();
          Outcome::Replaced
        } else {
          Outcome::Added
        };
        document
          .insert_header(&self.header)
          .with_context(|| format!("Failed to render header for {}", path.display()))?;
        self.persist(path, &document.output(), FORMATTED_SUFFIX)?;
        outcome
      }
      Action::Remove if document.header_detected() => {
        document.remove_header();
        self.persist(path, &document.output(), REMOVED_SUFFIX)?;
        Outcome::Removed
      }
      Action::Remove => Outcome::Noop,
    };

    trace!("{}: {}", path.display(), outcome);
    Ok(outcome)
  }

  fn persist(&self, path: &Path, content: &str, dry_run_suffix: &str) -> Result<()> {
    if self.dry_run {
      let target = FileIO::sibling_path(path, dry_run_suffix);
      debug!("Dry run: writing {}", target.display());
      FileIO::write_file(&target, content)
    } else {
      FileIO::write_file(path, content)
    }
  }

  fn is_header_file(&self, path: &Path) -> bool {
    self.header_file.as_deref() == Some(path)
  }
}

/// Processor for running header actions on a tree.
///
/// The `Processor` is responsible for:
/// - Selecting files by include and exclude patterns and git ignore rules
/// - Resolving the header style of every file
/// - Checking, adding, replacing and removing headers
/// - Collecting the outcome of each file into a report
pub struct Processor {
  selector: Selector,
  ignore_checker: Option<Box<dyn IgnoreChecker>>,
  files: FileProcessor,
  threads: usize,
}

impl Processor {
  /// Batch size for processing files to reduce overhead.
  const BATCH_SIZE: usize = 8;

  /// Creates a processor for `config`.
  ///
  /// # Parameters
  ///
  /// * `config` - Loaded configuration, with paths already resolved
  ///
  /// # Returns
  ///
  /// A new `Processor` instance or an error if initialization fails.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  /// - The configuration is invalid
  /// - The header template or an additional style document cannot be found
  /// - A style document or the mapping is malformed
  /// - Git ignore or attrs support is enabled but no repository is found
  pub fn new(config: &Config) -> Result<Self> {
    config.validate()?;

    let finder = ResourceFinder::new(&config.base_dir, &config.config_dir);

    let mut registry = StyleRegistry::with_defaults()?;
    for name in &config.additional_headers {
      let resource = finder
        .find(name)
        .with_context(|| format!("Failed to load header styles {}", name))?;
      let styles = parse_styles(&resource.location.to_string(), &resource.content)?;
      verbose_log!("Loaded {} header styles from {}", styles.len(), resource.location);
      registry.merge(styles);
    }

    let mapping = MappingTable::build(&config.mapping, config.use_default_mapping, &registry)?;

    let mut excludes = config.excludes.clone();
    let (header, header_file) = match (&config.inline_header, &config.header_path) {
      (Some(inline), _) => (HeaderContent::new(inline), None),
      (None, Some(header_path)) => {
        let resource = finder
          .find(header_path)
          .with_context(|| format!("Failed to load header {}", header_path))?;
        verbose_log!("Using header from {}", resource.location);
        excludes.push(header_path.clone());
        let header_file = match &resource.location {
          Location::File(path) => path.canonicalize().ok(),
          Location::Bundled(_) => None,
        };
        (HeaderContent::new(&resource.content), header_file)
      }
      (None, None) => return Err(ConfigError::MissingHeaderSource.into()),
    };

    let selector = Selector::new(&SelectionConfig {
      root: config.base_dir.clone(),
      includes: config.includes.clone(),
      excludes,
      use_default_excludes: config.use_default_excludes,
      case_sensitive: config.case_sensitive,
    })?;

    let ignore_checker = resolve_ignore_checker(&config.base_dir, config.git.ignore)?;

    let factory = DocumentFactory::new(
      mapping,
      registry,
      config.string_properties()?,
      config.effective_keywords(),
    )
    .with_git_history(resolve_git_history(&config.base_dir, config.git.attrs)?);

    let threads = config.threads.unwrap_or_else(num_cpus::get).max(1);

    Ok(Self {
      selector,
      ignore_checker,
      files: FileProcessor {
        factory,
        header,
        header_file,
        strict_check: config.strict_check,
        dry_run: config.dry_run,
      },
      threads,
    })
  }

  /// Root the selection starts from.
  pub fn base_dir(&self) -> &Path {
    self.selector.root()
  }

  /// The selected files as canonical paths, sorted.
  pub fn selected_files(&self) -> Result<Vec<PathBuf>> {
    let root = self
      .selector
      .root()
      .canonicalize()
      .with_context(|| format!("Failed to resolve base directory: {}", self.selector.root().display()))?;

    let mut files: Vec<PathBuf> = self
      .selector
      .select(self.ignore_checker.as_deref())?
      .into_iter()
      .map(|rel| root.join(rel))
      .filter(|path| {
        let skip = self.files.is_header_file(path);
        if skip {
          debug!("Skipping header template {}", path.display());
        }
        !skip
      })
      .collect();
    files.sort();
    Ok(files)
  }

  /// Runs `action` on every selected file.
  ///
  /// Files are processed in batches on a pool of `threads` workers. A file that
  /// cannot be processed is recorded as [`Outcome::Error`] and does not stop
  /// the run.
  ///
  /// # Parameters
  ///
  /// * `action` - What to do with each file
  ///
  /// # Returns
  ///
  /// The report holding one outcome per selected file.
  ///
  /// # Errors
  ///
  /// Returns an error if the selection fails or the worker pool cannot be
  /// created.
  pub fn run(&self, action: Action) -> Result<Report> {
    let files = self.selected_files()?;
    self.run_on(action, &files)
  }

  /// Runs `action` on `files`, which must be canonical paths.
  pub fn run_on(&self, action: Action, files: &[PathBuf]) -> Result<Report> {
    let report = Report::new(action);
    if files.is_empty() {
      debug!("No files to process");
      return Ok(report);
    }

    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(self.threads)
      .build()
      .context("Failed to create worker pool")?;

    debug!(
      "Processing {} files in batches of {} with {} threads",
      files.len(),
      Self::BATCH_SIZE,
      self.threads
    );

    let process_start = std::time::Instant::now();
    let worker = &self.files;
    let shared = &report;
    pool.install(|| {
      files.par_chunks(Self::BATCH_SIZE).for_each(|batch| {
        for path in batch {
          let outcome = worker.process(path, action).unwrap_or_else(|e| {
            warn!("Failed to process {}: {:#}", path.display(), e);
            Outcome::Error(format!("{e:#}"))
          });
          shared.add(path.clone(), outcome);
        }
      });
    });

    debug!(
      "Processed {} files in {}ms",
      files.len(),
      process_start.elapsed().as_millis()
    );

    Ok(report)
  }
}
