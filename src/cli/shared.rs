//! # Shared Command Plumbing
//!
//! Flags common to every subcommand and the run loop they share: load the
//! configuration, build the processor, run the action, print the results and
//! write the requested reports.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use crate::config::{ConfigOverrides, load_config};
use crate::info_log;
use crate::logging::{ColorMode, init_tracing, set_output_mode};
use crate::output::{
  CategorizedOutcomes, print_all_files_ok, print_blank_line, print_hint, print_outcomes, print_start_message,
  print_summary,
};
use crate::processor::Processor;
use crate::report::{Action, ProcessingSummary, Report, ReportFormat, ReportGenerator};

/// Arguments accepted by every subcommand
#[derive(Args, Debug, Default, Clone)]
pub struct SharedArgs {
  /// Path to config file (default: $HEADMARK_CONFIG, then headmark.toml in
  /// the current directory)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Compare headers line by line
  #[arg(long, conflicts_with = "lenient")]
  pub strict: bool,

  /// Compare headers ignoring whitespace
  #[arg(long)]
  pub lenient: bool,

  /// Number of worker threads (default: number of CPUs)
  #[arg(long, value_name = "N")]
  pub threads: Option<usize>,

  /// Fail if a selected file has no known header style
  #[arg(long)]
  pub fail_if_unknown: bool,

  /// Generate a JSON report and save it to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_json: Option<PathBuf>,

  /// Generate a CSV report and save it to the specified path
  #[arg(long, value_name = "OUTPUT")]
  pub report_csv: Option<PathBuf>,

  /// Increase verbosity (-v debug, -vv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Control when to use colored output (auto, never, always)
  #[arg(
    long,
    value_name = "WHEN",
    num_args = 0..=1,
    default_value_t = ColorMode::Auto,
    default_missing_value = "always",
    value_enum
  )]
  pub colors: ColorMode,
}

impl SharedArgs {
  fn strict_override(&self) -> Option<bool> {
    match (self.strict, self.lenient) {
      (true, _) => Some(true),
      (_, true) => Some(false),
      _ => None,
    }
  }

  /// Sets up diagnostics and user output for this invocation.
  pub fn init_output(&self) {
    init_tracing(self.quiet, self.verbose);
    set_output_mode(self.quiet, self.verbose);
    self.colors.apply();
  }
}

/// What a finished run produced.
pub struct RunResult {
  pub report: Report,
  pub summary: ProcessingSummary,
}

impl RunResult {
  /// Whether the run fails regardless of the action specific rules.
  pub fn failed_common(&self, args: &SharedArgs) -> bool {
    self.report.has_errors() || (args.fail_if_unknown && self.report.has_unknown())
  }
}

/// Runs `action` with the shared flags.
///
/// # Parameters
///
/// * `args` - Flags shared by all subcommands
/// * `action` - The action to run
/// * `dry_run` - Dry-run override from the edit subcommands
///
/// # Returns
///
/// The report and its summary. Output lists and report files have already been
/// written.
pub fn execute(args: &SharedArgs, action: Action, dry_run: Option<bool>) -> Result<RunResult> {
  args.init_output();

  let working_dir = std::env::current_dir().context("Failed to get current directory")?;
  let mut config = load_config(args.config.as_deref(), &working_dir)?;
  config.apply_overrides(&ConfigOverrides {
    dry_run,
    strict_check: args.strict_override(),
    threads: args.threads,
  });
  debug!("Running {} with base directory {}", action, config.base_dir.display());

  let processor = Processor::new(&config)?;
  let base_dir = processor
    .base_dir()
    .canonicalize()
    .unwrap_or_else(|_| processor.base_dir().to_path_buf());

  let files = processor.selected_files()?;
  print_start_message(files.len(), action);

  let start_time = Instant::now();
  let report = processor.run_on(action, &files)?;
  let summary = ProcessingSummary::from_report(&report, start_time.elapsed());

  let categorized = CategorizedOutcomes::from_report(&report);
  print_blank_line();
  print_outcomes(&categorized, action, &base_dir);
  if !categorized.has_changes_or_problems() {
    print_all_files_ok(action);
  }

  print_blank_line();
  print_summary(&summary);

  if action == Action::Check && !categorized.missing.is_empty() {
    print_blank_line();
    print_hint("Run `headmark format` to add the missing headers.");
  }
  if config.dry_run && action != Action::Check && report.has_updates() {
    print_blank_line();
    print_hint("Dry run: results were written next to the original files.");
  }

  write_reports(args, &report, &summary, &base_dir);

  Ok(RunResult { report, summary })
}

/// Write the requested report files. A failed report does not fail the run.
fn write_reports(args: &SharedArgs, report: &Report, summary: &ProcessingSummary, base_dir: &Path) {
  let requested = [
    (ReportFormat::Json, args.report_json.as_deref()),
    (ReportFormat::Csv, args.report_csv.as_deref()),
  ];

  for (format, output_path) in requested {
    let Some(output_path) = output_path else {
      continue;
    };
    let report_generator = ReportGenerator::new(format, output_path);
    if let Err(e) = report_generator.generate(report, summary, base_dir) {
      eprintln!("Error generating {} report: {:#}", format, e);
    } else {
      info_log!("Generated {} report at {}", format, output_path.display());
    }
  }
}
