//! # Logging Module
//!
//! Messages meant for the user, and the global output mode deciding which of
//! them are printed. Diagnostics go through `tracing`; see [`init_tracing`].
//!
//! [`verbose_log!`](crate::verbose_log) prints dimmed text to stderr in
//! verbose mode only. [`info_log!`](crate::info_log) prints to stdout unless
//! quiet.

mod modes;

use std::fmt::Arguments;

pub use modes::{ColorMode, init_tracing, is_quiet, is_verbose, set_output_mode};
use owo_colors::{OwoColorize, Stream};

/// Prints a message to stderr in verbose mode.
#[macro_export]
macro_rules! verbose_log {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Channel::Verbose, format_args!($($arg)*))
    };
}

/// Prints a message to stdout unless quiet.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::logging::emit($crate::logging::Channel::Info, format_args!($($arg)*))
    };
}

/// Destination of a user message.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
  Info,
  Verbose,
}

impl Channel {
  fn enabled(self) -> bool {
    match self {
      Channel::Info => !is_quiet(),
      Channel::Verbose => is_verbose(),
    }
  }
}

/// Backend of the logging macros.
#[doc(hidden)]
pub fn emit(channel: Channel, message: Arguments<'_>) {
  if !channel.enabled() {
    return;
  }
  let message = message.to_string();
  match channel {
    Channel::Info => println!("{}", message.if_supports_color(Stream::Stdout, |m| m.yellow())),
    Channel::Verbose => eprintln!("{}", message.if_supports_color(Stream::Stderr, |m| m.dimmed())),
  }
}
