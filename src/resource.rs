//! # Resource Module
//!
//! Looks up header templates and header style documents named in the
//! configuration. A name is tried, in order:
//!
//! 1. relative to the base directory
//! 2. relative to the directory of the config file
//! 3. as given, absolute or relative to the working directory
//! 4. among the templates bundled with headmark
//!
//! Resources are never fetched over the network.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::verbose_log;

/// Header templates shipped with headmark, by name.
const BUNDLED: &[(&str, &str)] = &[
  ("Apache-2.0.txt", include_str!("headers/Apache-2.0.txt")),
  ("Apache-2.0-ASF.txt", include_str!("headers/Apache-2.0-ASF.txt")),
  ("MIT.txt", include_str!("headers/MIT.txt")),
];

/// Where a resource was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
  File(PathBuf),
  Bundled(&'static str),
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::File(path) => write!(f, "{}", path.display()),
      Self::Bundled(name) => write!(f, "bundled:{name}"),
    }
  }
}

/// A resolved resource and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
  pub location: Location,
  pub content: String,
}

/// Error type for resource lookups.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
  #[error("Resource '{name}' not found (looked in {searched})")]
  NotFound { name: String, searched: String },

  #[error("Failed to read resource '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },
}

/// Resolves resource names against the project directories.
#[derive(Debug, Clone)]
pub struct ResourceFinder {
  base_dir: PathBuf,
  config_dir: PathBuf,
}

impl ResourceFinder {
  pub fn new(base_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
    Self {
      base_dir: base_dir.into(),
      config_dir: config_dir.into(),
    }
  }

  fn candidates(&self, name: &str) -> Vec<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() {
      return vec![path.to_path_buf()];
    }
    vec![self.base_dir.join(path), self.config_dir.join(path), path.to_path_buf()]
  }

  /// Finds the resource called `name`.
  ///
  /// # Parameters
  ///
  /// * `name` - File path or bundled template name
  ///
  /// # Returns
  ///
  /// The first match in lookup order.
  ///
  /// # Errors
  ///
  /// Returns [`ResourceError::NotFound`] if no location has the resource, and
  /// [`ResourceError::ReadError`] if a file exists but cannot be read.
  pub fn find(&self, name: &str) -> Result<Resource, ResourceError> {
    let candidates = self.candidates(name);

    for candidate in &candidates {
      if !candidate.is_file() {
        continue;
      }
      let content = std::fs::read_to_string(candidate).map_err(|source| ResourceError::ReadError {
        path: candidate.clone(),
        source,
      })?;
      verbose_log!("Found resource {} at {}", name, candidate.display());
      return Ok(Resource {
        location: Location::File(candidate.clone()),
        content,
      });
    }

    if let Some((bundled, content)) = BUNDLED.iter().find(|(bundled, _)| *bundled == name) {
      verbose_log!("Using bundled resource {}", bundled);
      return Ok(Resource {
        location: Location::Bundled(bundled),
        content: (*content).to_string(),
      });
    }

    let searched = candidates
      .iter()
      .map(|c| c.display().to_string())
      .chain(std::iter::once("bundled templates".to_string()))
      .collect::<Vec<_>>()
      .join(", ");
    Err(ResourceError::NotFound {
      name: name.to_string(),
      searched,
    })
  }
}
