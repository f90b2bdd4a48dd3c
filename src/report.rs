//! # Report Module
//!
//! This module collects the outcome of every processed file and writes them
//! out as JSON or CSV.
//!
//! A [`Report`] is shared by the worker threads of a run; each file gets
//! exactly one [`Outcome`].

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::ValueEnum;
use serde::Serialize;
use tracing::warn;

/// What a run does to the selected files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  /// Only report whether headers are present.
  Check,
  /// Add or replace headers.
  Format,
  /// Delete headers.
  Remove,
}

impl Action {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Check => "check",
      Self::Format => "format",
      Self::Remove => "remove",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Result of processing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The header is present (check)
  Present,
  /// The header is missing (check)
  Missing,
  /// Nothing had to change (format, remove)
  Noop,
  /// A header was added (format)
  Added,
  /// A different header was replaced (format)
  Replaced,
  /// The header was removed (remove)
  Removed,
  /// The file has no known header style, or is not text
  Unknown,
  /// The file could not be processed
  Error(String),
}

impl Outcome {
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Present => "present",
      Self::Missing => "missing",
      Self::Noop => "noop",
      Self::Added => "added",
      Self::Replaced => "replaced",
      Self::Removed => "removed",
      Self::Unknown => "unknown",
      Self::Error(_) => "error",
    }
  }

  /// Whether the file content was changed.
  pub const fn is_update(&self) -> bool {
    matches!(self, Self::Added | Self::Replaced | Self::Removed)
  }

  pub fn message(&self) -> Option<&str> {
    match self {
      Self::Error(message) => Some(message),
      _ => None,
    }
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Error(message) => write!(f, "error: {message}"),
      other => f.write_str(other.as_str()),
    }
  }
}

/// Outcomes of one run, keyed by canonical path.
#[derive(Debug)]
pub struct Report {
  pub action: Action,
  results: Mutex<HashMap<PathBuf, Outcome>>,
}

impl Report {
  pub fn new(action: Action) -> Self {
    Self {
      action,
      results: Mutex::new(HashMap::new()),
    }
  }

  /// Records the outcome of `path`. A path keeps its first outcome.
  pub fn add(&self, path: PathBuf, outcome: Outcome) {
    let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(existing) = results.get(&path) {
      warn!(
        "Ignoring second outcome {} for {} (already {})",
        outcome,
        path.display(),
        existing
      );
      return;
    }
    results.insert(path, outcome);
  }

  pub fn get(&self, path: &Path) -> Option<Outcome> {
    self.lock().get(path).cloned()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Number of files with an outcome satisfying `predicate`.
  pub fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
    self.lock().values().filter(|o| predicate(o)).count()
  }

  pub fn has_missing(&self) -> bool {
    self.count(|o| *o == Outcome::Missing) > 0
  }

  pub fn has_updates(&self) -> bool {
    self.count(Outcome::is_update) > 0
  }

  pub fn has_unknown(&self) -> bool {
    self.count(|o| *o == Outcome::Unknown) > 0
  }

  pub fn has_errors(&self) -> bool {
    self.count(|o| matches!(o, Outcome::Error(_))) > 0
  }

  /// All outcomes sorted by path.
  pub fn entries(&self) -> Vec<(PathBuf, Outcome)> {
    let mut entries: Vec<_> = self.lock().iter().map(|(p, o)| (p.clone(), o.clone())).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
  }

  /// Sorted paths whose outcome satisfies `predicate`.
  pub fn paths(&self, predicate: impl Fn(&Outcome) -> bool) -> Vec<PathBuf> {
    self
      .entries()
      .into_iter()
      .filter(|(_, o)| predicate(o))
      .map(|(p, _)| p)
      .collect()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Outcome>> {
    self.results.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
  /// JSON format for machine readability
  Json,
  /// CSV format for spreadsheet compatibility
  Csv,
}

impl fmt::Display for ReportFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReportFormat::Json => write!(f, "JSON"),
      ReportFormat::Csv => write!(f, "CSV"),
    }
  }
}

/// Summary of the processing results
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
  pub action: Action,
  /// Total number of files processed
  pub total_files: usize,
  pub present: usize,
  pub missing: usize,
  pub noop: usize,
  pub added: usize,
  pub replaced: usize,
  pub removed: usize,
  pub unknown: usize,
  pub errors: usize,
  /// Total processing time
  #[serde(skip_serializing)]
  pub processing_time: Duration,
  /// Processing time in seconds for serialization
  #[serde(rename = "processing_time_seconds")]
  pub processing_time_secs: f64,
  /// Timestamp when the report was generated
  pub timestamp: i64,
}

impl ProcessingSummary {
  /// Create a summary of `report`
  pub fn from_report(report: &Report, processing_time: Duration) -> Self {
    let mut summary = Self {
      action: report.action,
      total_files: 0,
      present: 0,
      missing: 0,
      noop: 0,
      added: 0,
      replaced: 0,
      removed: 0,
      unknown: 0,
      errors: 0,
      processing_time,
      processing_time_secs: processing_time.as_secs_f64(),
      timestamp: Local::now().timestamp(),
    };

    for (_, outcome) in report.entries() {
      summary.total_files += 1;
      let counter = match outcome {
        Outcome::Present => &mut summary.present,
        Outcome::Missing => &mut summary.missing,
        Outcome::Noop => &mut summary.noop,
        Outcome::Added => &mut summary.added,
        Outcome::Replaced => &mut summary.replaced,
        Outcome::Removed => &mut summary.removed,
        Outcome::Unknown => &mut summary.unknown,
        Outcome::Error(_) => &mut summary.errors,
      };
      *counter += 1;
    }

    summary
  }

  /// Counts as `(label, value)` pairs, in display order.
  pub fn counts(&self) -> [(&'static str, usize); 8] {
    [
      ("present", self.present),
      ("missing", self.missing),
      ("noop", self.noop),
      ("added", self.added),
      ("replaced", self.replaced),
      ("removed", self.removed),
      ("unknown", self.unknown),
      ("errors", self.errors),
    ]
  }
}

#[derive(Serialize)]
struct FileEntry<'a> {
  path: String,
  outcome: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  message: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
  summary: &'a ProcessingSummary,
  files: Vec<FileEntry<'a>>,
}

/// Report Generator for writing reports to disk
pub struct ReportGenerator<'a> {
  /// Format of the report to generate
  format: ReportFormat,
  /// Path where the report will be saved
  output_path: &'a Path,
}

impl<'a> ReportGenerator<'a> {
  /// Create a new report generator
  ///
  /// # Parameters
  ///
  /// * `format` - The format to use for the report
  /// * `output_path` - The path where the report will be saved
  pub const fn new(format: ReportFormat, output_path: &'a Path) -> Self {
    Self { format, output_path }
  }

  /// Generate a report file
  ///
  /// # Parameters
  ///
  /// * `report` - Outcomes of the run
  /// * `summary` - Processing summary information
  /// * `base_dir` - Paths are written relative to this directory
  ///
  /// # Returns
  ///
  /// `Ok(())` if the report was generated successfully, or an error if the
  /// report couldn't be generated or written to disk.
  pub fn generate(&self, report: &Report, summary: &ProcessingSummary, base_dir: &Path) -> Result<()> {
    let entries = report.entries();
    let content = match self.format {
      ReportFormat::Json => Self::generate_json(&entries, summary, base_dir)?,
      ReportFormat::Csv => Self::generate_csv(&entries, summary, base_dir),
    };

    fs::write(self.output_path, content)
      .with_context(|| format!("Failed to write report to {}", self.output_path.display()))
  }

  fn generate_json(entries: &[(PathBuf, Outcome)], summary: &ProcessingSummary, base_dir: &Path) -> Result<String> {
    let files = entries
      .iter()
      .map(|(path, outcome)| FileEntry {
        path: display_path(path, base_dir),
        outcome: outcome.as_str(),
        message: outcome.message(),
      })
      .collect();

    let report = JsonReport { summary, files };
    serde_json::to_string_pretty(&report).context("Failed to serialize JSON report")
  }

  fn generate_csv(entries: &[(PathBuf, Outcome)], summary: &ProcessingSummary, base_dir: &Path) -> String {
    let mut csv = String::new();

    csv.push_str("file_path,outcome,message\n");
    for (path, outcome) in entries {
      let path = csv_field(&display_path(path, base_dir));
      let message = outcome.message().map(csv_field).unwrap_or_default();
      csv.push_str(&format!("{},{},{}\n", path, outcome.as_str(), message));
    }

    csv.push_str("\n# Summary\n");
    csv.push_str(&format!("Action,{}\n", summary.action));
    csv.push_str(&format!("Total files processed,{}\n", summary.total_files));
    for (label, count) in summary.counts() {
      csv.push_str(&format!("{},{}\n", label, count));
    }
    csv.push_str(&format!(
      "Processing time (seconds),{:.2}\n",
      summary.processing_time.as_secs_f64()
    ));
    csv.push_str(&format!("Generated on,{}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));

    csv
  }
}

/// Path relative to `base_dir` when possible, with `/` separators.
pub fn display_path(path: &Path, base_dir: &Path) -> String {
  pathdiff::diff_paths(path, base_dir)
    .filter(|rel| !rel.starts_with(".."))
    .unwrap_or_else(|| path.to_path_buf())
    .to_string_lossy()
    .replace('\\', "/")
}

fn csv_field(value: &str) -> String {
  if value.contains([',', '"', '\n']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}
