//! # Edit Commands
//!
//! This module implements the `format` and `remove` commands, which rewrite
//! the selected files.

use anyhow::Result;
use clap::Args;

use super::shared::{SharedArgs, execute};
use crate::report::Action;

/// Arguments for the format and remove commands
#[derive(Args, Debug, Clone)]
pub struct EditArgs {
  #[command(flatten)]
  pub shared: SharedArgs,

  /// Write results to `<file>.formatted` or `<file>.removed` instead of
  /// modifying files
  #[arg(long)]
  pub dry_run: bool,

  /// Fail if a file was modified
  #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
  pub fail_if_updated: bool,
}

/// Run the format command: add missing headers and replace outdated ones.
///
/// # Returns
///
/// `true` if the run failed.
pub fn run_format(args: &EditArgs) -> Result<bool> {
  run_edit(args, Action::Format)
}

/// Run the remove command: delete existing headers.
///
/// # Returns
///
/// `true` if the run failed.
pub fn run_remove(args: &EditArgs) -> Result<bool> {
  run_edit(args, Action::Remove)
}

fn run_edit(args: &EditArgs, action: Action) -> Result<bool> {
  // only a given flag overrides the config file
  let dry_run = args.dry_run.then_some(true);
  let result = execute(&args.shared, action, dry_run)?;
  let updated = args.fail_if_updated && result.report.has_updates();
  Ok(updated || result.failed_common(&args.shared))
}
