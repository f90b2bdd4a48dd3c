//! # CLI Module
//!
//! This module contains the command-line interface implementation.
//! It uses clap for argument parsing with one subcommand per action.

mod check;
mod edit;
mod shared;

pub use check::{CheckArgs, run_check};
use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Parser, Subcommand};
pub use edit::{EditArgs, run_format, run_remove};
pub use shared::{RunResult, SharedArgs, execute};

const CUSTOM_STYLES: Styles = Styles::styled()
  .header(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .usage(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))).bold())
  .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))).bold())
  .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
  .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))).bold())
  .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
  .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))));

const VERSION: &str = concat!(
  env!("CARGO_PKG_VERSION"),
  " (",
  env!("GIT_HASH"),
  " ",
  env!("GIT_DATE"),
  ")"
);

/// Top-level CLI arguments
#[derive(Parser, Debug)]
#[command(
  author,
  version = VERSION,
  about,
  styles = CUSTOM_STYLES,
  after_help = "Examples:
  # Report files without the header configured in headmark.toml
  headmark check

  # Add missing headers and replace outdated ones
  headmark format

  # Preview the changes as <file>.formatted next to each file
  headmark format --dry-run

  # Remove headers, using another config file
  headmark remove --config path/to/headmark.toml

  # Write a JSON report of every file
  headmark check --report-json report.json
",
  help_template = "{before-help}{name} v{version}
{about-section}
{usage-heading} {usage}

{all-args}{after-help}
"
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
  /// Check that every file carries the header
  Check(CheckArgs),
  /// Add missing headers and replace outdated ones
  Format(EditArgs),
  /// Remove existing headers
  Remove(EditArgs),
}

impl Cli {
  /// Parse CLI arguments and return the Cli struct
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Run the selected subcommand.
  ///
  /// # Returns
  ///
  /// `true` if the run failed and the process should exit with status 1.
  pub fn run(&self) -> anyhow::Result<bool> {
    match &self.command {
      Command::Check(args) => run_check(args),
      Command::Format(args) => run_format(args),
      Command::Remove(args) => run_remove(args),
    }
  }
}
