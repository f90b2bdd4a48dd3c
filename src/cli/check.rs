//! # Check Command
//!
//! This module implements the `check` command, which reports files missing
//! the configured header without modifying anything.

use anyhow::Result;
use clap::Args;

use super::shared::{SharedArgs, execute};
use crate::report::Action;

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
  #[command(flatten)]
  pub shared: SharedArgs,

  /// Fail if a file is missing the header
  #[arg(long, value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
  pub fail_if_missing: bool,
}

/// Run the check command with the given arguments
///
/// # Returns
///
/// `true` if the check failed.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
  let result = execute(&args.shared, Action::Check, None)?;
  let missing = args.fail_if_missing && result.report.has_missing();
  Ok(missing || result.failed_common(&args.shared))
}
