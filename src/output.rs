//! # Output Module
//!
//! This module centralizes all user-facing output for headmark.
//! It provides consistent formatting, colors, and symbols for terminal output.
//!
//! ## Design Goals
//!
//! - **Informative**: Show actionable information without requiring flags
//! - **Scannable**: Use formatting to make output easy to parse visually
//! - **Progressive**: More detail with `-v`, silence with `-q`
//! - **Scriptable**: Keep stdout predictable for piping/automation

use std::path::{Path, PathBuf};

use owo_colors::{OwoColorize, Stream};

use crate::logging::{is_quiet, is_verbose};
use crate::report::{Action, Outcome, ProcessingSummary, Report, display_path};

/// Symbols used in output
pub mod symbols {
  /// Success/has header
  pub const SUCCESS: &str = "\u{2713}"; // ✓
  /// Missing header/failure
  pub const FAILURE: &str = "\u{2717}"; // ✗
  /// Unknown file type
  pub const UNKNOWN: &str = "?";
  /// Header replaced
  pub const UPDATED: &str = "\u{21bb}"; // ↻
  /// Header removed
  pub const REMOVED: &str = "-";
}

/// Maximum number of files to show in the default output before truncating
const DEFAULT_FILE_LIST_LIMIT: usize = 20;

/// Color applied to a list heading symbol.
#[derive(Debug, Clone, Copy)]
enum Tone {
  Good,
  Bad,
  Warn,
  Dim,
}

fn paint(symbol: &str, tone: Tone) -> String {
  match tone {
    Tone::Good => symbol.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    Tone::Bad => symbol.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
    Tone::Warn => symbol.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
    Tone::Dim => symbol.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string(),
  }
}

const fn files_word(count: usize) -> &'static str {
  if count == 1 { "file" } else { "files" }
}

/// Print the initial "Checking N files..." message.
pub fn print_start_message(file_count: usize, action: Action) {
  if is_quiet() {
    return;
  }

  let verb = match action {
    Action::Check => "Checking",
    Action::Format => "Formatting",
    Action::Remove => "Removing headers from",
  };

  println!("{} {} {}...", verb, file_count, files_word(file_count));
}

/// Print a blank line for visual separation (respects quiet mode).
pub fn print_blank_line() {
  if !is_quiet() {
    println!();
  }
}

/// Print a titled list of files.
///
/// Shows up to `limit` files (or `DEFAULT_FILE_LIST_LIMIT` if None).
/// In verbose mode, shows all files. In quiet mode only the paths are printed
/// when `scriptable` is set.
fn print_file_list(
  files: &[PathBuf],
  base_dir: &Path,
  title: &str,
  symbol: &str,
  tone: Tone,
  limit: Option<usize>,
  scriptable: bool,
) {
  if files.is_empty() {
    return;
  }

  if is_quiet() {
    if scriptable {
      for file in files {
        println!("{}", display_path(file, base_dir));
      }
    }
    return;
  }

  let count = files.len();
  println!("{} {} {} {}:", paint(symbol, tone), count, files_word(count), title);

  let show_all = is_verbose();
  let effective_limit = if show_all {
    count
  } else {
    limit.unwrap_or(DEFAULT_FILE_LIST_LIMIT)
  };

  for file in files.iter().take(effective_limit) {
    println!("  {}", display_path(file, base_dir));
  }

  if !show_all && count > effective_limit {
    let remaining = count - effective_limit;
    println!(
      "  {} ... and {} more (use -v to see all)",
      "".if_supports_color(Stream::Stdout, |s| s.dimmed()),
      remaining
    );
  }
}

/// Paths of a report grouped by what happened to them.
#[derive(Debug, Default)]
pub struct CategorizedOutcomes {
  pub present: Vec<PathBuf>,
  pub missing: Vec<PathBuf>,
  pub noop: Vec<PathBuf>,
  pub added: Vec<PathBuf>,
  pub replaced: Vec<PathBuf>,
  pub removed: Vec<PathBuf>,
  pub unknown: Vec<PathBuf>,
  pub errors: Vec<(PathBuf, String)>,
}

impl CategorizedOutcomes {
  pub fn from_report(report: &Report) -> Self {
    let mut categorized = Self::default();
    for (path, outcome) in report.entries() {
      match outcome {
        Outcome::Present => categorized.present.push(path),
        Outcome::Missing => categorized.missing.push(path),
        Outcome::Noop => categorized.noop.push(path),
        Outcome::Added => categorized.added.push(path),
        Outcome::Replaced => categorized.replaced.push(path),
        Outcome::Removed => categorized.removed.push(path),
        Outcome::Unknown => categorized.unknown.push(path),
        Outcome::Error(message) => categorized.errors.push((path, message)),
      }
    }
    categorized
  }

  /// Whether anything is worth reporting besides the summary.
  pub fn has_changes_or_problems(&self) -> bool {
    !(self.missing.is_empty()
      && self.added.is_empty()
      && self.replaced.is_empty()
      && self.removed.is_empty()
      && self.errors.is_empty())
  }
}

/// Print the per-outcome file lists for `action`.
pub fn print_outcomes(categorized: &CategorizedOutcomes, action: Action, base_dir: &Path) {
  match action {
    Action::Check => {
      print_file_list(
        &categorized.missing,
        base_dir,
        "missing headers",
        symbols::FAILURE,
        Tone::Bad,
        None,
        true,
      );
    }
    Action::Format => {
      print_file_list(
        &categorized.added,
        base_dir,
        "with added headers",
        symbols::SUCCESS,
        Tone::Good,
        None,
        true,
      );
      if !categorized.added.is_empty() && !categorized.replaced.is_empty() {
        print_blank_line();
      }
      print_file_list(
        &categorized.replaced,
        base_dir,
        "with replaced headers",
        symbols::UPDATED,
        Tone::Warn,
        None,
        true,
      );
    }
    Action::Remove => {
      print_file_list(
        &categorized.removed,
        base_dir,
        "with removed headers",
        symbols::REMOVED,
        Tone::Warn,
        None,
        true,
      );
    }
  }

  if is_verbose() && !categorized.unknown.is_empty() {
    print_blank_line();
    print_file_list(
      &categorized.unknown,
      base_dir,
      "with unknown header style",
      symbols::UNKNOWN,
      Tone::Dim,
      None,
      false,
    );
  }

  print_errors(&categorized.errors, base_dir);
}

/// Print files that failed to process. Errors are shown even in quiet mode.
fn print_errors(errors: &[(PathBuf, String)], base_dir: &Path) {
  if errors.is_empty() {
    return;
  }

  print_blank_line();
  eprintln!(
    "{} {} {} could not be processed:",
    symbols::FAILURE.if_supports_color(Stream::Stderr, |s| s.red()),
    errors.len(),
    files_word(errors.len())
  );
  for (path, message) in errors {
    eprintln!("  {}: {}", display_path(path, base_dir), message);
  }
}

/// Print the success message when there is nothing to report.
pub fn print_all_files_ok(action: Action) {
  if is_quiet() {
    return;
  }

  let message = match action {
    Action::Check => "All files have headers.",
    Action::Format => "All files already have headers.",
    Action::Remove => "No headers to remove.",
  };
  println!("{} {}", symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()), message);
}

/// Print the processing summary.
///
/// Format: "Summary: X present, Y missing, Z unknown"
/// Only non-zero counts are listed. In verbose mode, also shows timing.
pub fn print_summary(summary: &ProcessingSummary) {
  if is_quiet() {
    return;
  }

  let parts: Vec<String> = summary
    .counts()
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(label, count)| {
      let count = match label {
        "missing" | "errors" => count.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
        "unknown" => count.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string(),
        _ => count.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string(),
      };
      format!("{} {}", count, label)
    })
    .collect();

  let mut summary_line = if parts.is_empty() {
    "Summary: no files".to_string()
  } else {
    format!("Summary: {}", parts.join(", "))
  };

  // Show timing in verbose mode
  if is_verbose() {
    summary_line.push_str(&format!(" ({:.2}s)", summary.processing_time.as_secs_f64()));
  }

  println!("{}", summary_line);
}

/// Print a hint for the user about what to do next.
pub fn print_hint(message: &str) {
  if is_quiet() {
    return;
  }

  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.yellow()));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_categorize_outcomes() {
    let report = Report::new(Action::Format);
    report.add(PathBuf::from("/p/a.rs"), Outcome::Added);
    report.add(PathBuf::from("/p/b.rs"), Outcome::Replaced);
    report.add(PathBuf::from("/p/c.rs"), Outcome::Noop);
    report.add(PathBuf::from("/p/d.bin"), Outcome::Unknown);
    report.add(PathBuf::from("/p/e.rs"), Outcome::Error("denied".to_string()));

    let categorized = CategorizedOutcomes::from_report(&report);
    assert_eq!(categorized.added, vec![PathBuf::from("/p/a.rs")]);
    assert_eq!(categorized.replaced.len(), 1);
    assert_eq!(categorized.noop.len(), 1);
    assert_eq!(categorized.unknown.len(), 1);
    assert_eq!(categorized.errors, vec![(PathBuf::from("/p/e.rs"), "denied".to_string())]);
    assert!(categorized.has_changes_or_problems());
  }

  #[test]
  fn test_nothing_to_report() {
    let report = Report::new(Action::Check);
    report.add(PathBuf::from("/p/a.rs"), Outcome::Present);
    report.add(PathBuf::from("/p/b.txt"), Outcome::Unknown);

    let categorized = CategorizedOutcomes::from_report(&report);
    assert!(!categorized.has_changes_or_problems());
  }

  #[test]
  fn test_files_word() {
    assert_eq!(files_word(1), "file");
    assert_eq!(files_word(0), "files");
    assert_eq!(files_word(2), "files");
  }
}
