use std::sync::atomic::{AtomicU8, Ordering};

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

const NORMAL: u8 = 0;
const QUIET: u8 = 1;
const VERBOSE: u8 = 2;

/// How much user facing output to print. Defaults to normal.
static OUTPUT_MODE: AtomicU8 = AtomicU8::new(NORMAL);

/// When to color user facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
  /// Color when the stream is a terminal
  #[default]
  Auto,
  Never,
  Always,
}

impl ColorMode {
  /// Makes this mode the one used by every `if_supports_color` call.
  pub fn apply(self) {
    match self {
      ColorMode::Auto => owo_colors::unset_override(),
      ColorMode::Never => owo_colors::set_override(false),
      ColorMode::Always => owo_colors::set_override(true),
    }
  }
}

/// Sets the output mode from the `-q` and `-v` flags. Verbose wins.
pub fn set_output_mode(quiet: bool, verbose: u8) {
  let mode = match (quiet, verbose) {
    (_, 1..) => VERBOSE,
    (true, 0) => QUIET,
    (false, 0) => NORMAL,
  };
  OUTPUT_MODE.store(mode, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
  OUTPUT_MODE.load(Ordering::SeqCst) == VERBOSE
}

/// Quiet mode keeps stdout to the scriptable file lists.
pub fn is_quiet() -> bool {
  OUTPUT_MODE.load(Ordering::SeqCst) == QUIET
}

/// Filter directives used when `RUST_LOG` is not set.
fn default_directives(quiet: bool, verbose: u8) -> &'static str {
  if quiet {
    return "error";
  }
  match verbose {
    0 => "warn",
    1 => "warn,headmark=debug",
    _ => "warn,headmark=trace",
  }
}

/// Initializes the `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the command line flags. Calling this more
/// than once leaves the first subscriber in place.
///
/// # Parameters
///
/// * `quiet` - Only show errors
/// * `verbose` - Number of `-v` flags given
pub fn init_tracing(quiet: bool, verbose: u8) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(quiet, verbose)));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}
