//! # headmark
//!
//! A tool that keeps license headers consistent across a source tree.
//!
//! `headmark` selects files with Ant-style include and exclude patterns, finds
//! the comment style of every file from its name, and then checks, adds,
//! replaces or removes the configured header. Files are modified in place, or
//! the result is written next to them in dry-run mode.
//!
//! ## Features
//!
//! * Header styles for over thirty comment syntaxes, extensible from TOML
//! * Detection of existing headers by keyword, for replacement or removal
//! * Strict or whitespace-insensitive header comparison
//! * `${property}` substitution in header templates
//! * Optional use of `.gitignore` rules when selecting files
//! * JSON and CSV reports
//!
//! ## Usage as a Library
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use headmark::config::load_config;
//! use headmark::processor::Processor;
//! use headmark::report::Action;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = load_config(None, Path::new("."))?;
//!     let processor = Processor::new(&config)?;
//!
//!     let report = processor.run(Action::Check)?;
//!     if report.has_missing() {
//!         println!("Some files are missing the header");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! * [`processor`] - Runs an action over the selected files
//! * [`header`] - Header styles, parsing and templates
//! * [`selection`] - File selection by pattern
//! * [`config`] - Configuration loading
//!
//! [`processor`]: crate::processor
//! [`header`]: crate::header
//! [`selection`]: crate::selection
//! [`config`]: crate::config

pub mod cli;
pub mod config;
pub mod document;
pub mod git;
pub mod header;
pub mod logging;
pub mod output;
pub mod pattern;
pub mod processor;
pub mod report;
pub mod resource;
pub mod selection;
