//! # headmark
//!
//! A tool that checks, adds and removes license headers in source files.

use std::process::ExitCode;

use anyhow::Result;
use headmark::cli::Cli;

fn main() -> Result<ExitCode> {
  let cli = Cli::parse_args();

  if cli.run()? {
    return Ok(ExitCode::FAILURE);
  }
  Ok(ExitCode::SUCCESS)
}
