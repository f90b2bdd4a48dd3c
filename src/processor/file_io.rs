//! # File I/O Module
//!
//! This module provides file reading and writing utilities for the processor.
//! It encapsulates synchronous file operations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::trace;

/// Suffix of the file written instead of the original by a dry-run format.
pub const FORMATTED_SUFFIX: &str = ".formatted";

/// Suffix of the file written instead of the original by a dry-run remove.
pub const REMOVED_SUFFIX: &str = ".removed";

/// File I/O operations for the processor.
///
/// This struct provides static methods for reading and writing files.
pub struct FileIO;

impl FileIO {
  /// Reads a whole file as text.
  ///
  /// # Parameters
  ///
  /// * `path` - Path to the file to read
  ///
  /// # Returns
  ///
  /// The file content, or `None` if the file is not valid UTF-8.
  pub fn read_text(path: &Path) -> Result<Option<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    match String::from_utf8(bytes) {
      Ok(text) => Ok(Some(text)),
      Err(e) => {
        trace!("{} is not UTF-8: {}", path.display(), e.utf8_error());
        Ok(None)
      }
    }
  }

  /// Write file content.
  ///
  /// # Parameters
  ///
  /// * `path` - Path to the file to write
  /// * `content` - Content to write to the file
  pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
  }

  /// `path` with `suffix` appended to its file name, e.g. `lib.rs` becomes
  /// `lib.rs.formatted`.
  pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_sibling_path() {
    assert_eq!(
      FileIO::sibling_path(Path::new("src/lib.rs"), FORMATTED_SUFFIX),
      PathBuf::from("src/lib.rs.formatted")
    );
    assert_eq!(
      FileIO::sibling_path(Path::new("Makefile"), REMOVED_SUFFIX),
      PathBuf::from("Makefile.removed")
    );
  }

  #[test]
  fn test_read_text_rejects_binary() {
    let dir = TempDir::new().expect("tempdir");
    let text = dir.path().join("a.txt");
    let binary = dir.path().join("a.bin");
    fs::write(&text, "hello\n").expect("write");
    fs::write(&binary, [0xff, 0xfe, 0x00, 0x41]).expect("write");

    assert_eq!(FileIO::read_text(&text).expect("read").as_deref(), Some("hello\n"));
    assert_eq!(FileIO::read_text(&binary).expect("read"), None);
    assert!(FileIO::read_text(&dir.path().join("missing")).is_err());
  }
}
