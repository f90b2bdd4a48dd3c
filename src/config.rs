//! # Configuration Module
//!
//! This module loads the `headmark.toml` project configuration: where the
//! header template comes from, which files are selected, how file names map
//! to header styles and which properties are substituted into the header.
//!
//! The configuration file is discovered from the `--config` flag, the
//! `HEADMARK_CONFIG` environment variable or `headmark.toml` in the current
//! directory. Without a file every option keeps its default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::verbose_log;

/// The default config file name.
pub const DEFAULT_CONFIG_FILENAME: &str = "headmark.toml";

/// Environment variable for specifying config file path.
pub const CONFIG_ENV_VAR: &str = "HEADMARK_CONFIG";

/// Keyword searched in existing headers when none are configured.
pub const DEFAULT_KEYWORD: &str = "copyright";

/// Tri-state switch for optional integrations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureGate {
  /// Use the integration when it can be initialized, skip it otherwise.
  #[default]
  Auto,
  /// Require the integration; failing to initialize it is an error.
  Enable,
  /// Never use the integration.
  Disable,
}

/// Settings for the git integration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
  /// Whether files ignored by git are left out of the selection.
  pub ignore: FeatureGate,
  /// Whether the `headmark.git.*` properties are computed from the commit
  /// history. Off unless asked for, since it walks every commit.
  pub attrs: FeatureGate,
}

impl Default for GitConfig {
  fn default() -> Self {
    Self {
      ignore: FeatureGate::Auto,
      attrs: FeatureGate::Disable,
    }
  }
}

/// File names and extensions mapped to one header style.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MappingConfig {
  /// Extensions without the leading dot, e.g. `"java"` or `"cmake.in"`.
  pub extensions: Vec<String>,
  /// Exact file names, e.g. `"Dockerfile"`.
  pub filenames: Vec<String>,
}

/// Main configuration struct for headmark.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
  /// Root of the files to process. Relative paths are resolved against the
  /// directory holding the config file.
  pub base_dir: PathBuf,

  /// Header text given directly in the config. Takes priority over
  /// `header_path`.
  pub inline_header: Option<String>,

  /// Location of the header template, looked up through the resource finder.
  pub header_path: Option<String>,

  /// Header style documents merged over the built-in styles.
  pub additional_headers: Vec<String>,

  /// Compare headers line by line instead of ignoring whitespace.
  pub strict_check: bool,

  pub use_default_excludes: bool,

  pub use_default_mapping: bool,

  /// Whether include and exclude patterns are case sensitive.
  pub case_sensitive: bool,

  /// Words an existing header must contain to be recognized as a license
  /// header.
  pub keywords: Vec<String>,

  pub includes: Vec<String>,

  pub excludes: Vec<String>,

  /// Values substituted for `${key}` references in the header. Only scalar
  /// values are allowed.
  pub properties: BTreeMap<String, toml::Value>,

  /// Header style id to the files that use it.
  pub mapping: BTreeMap<String, MappingConfig>,

  pub git: GitConfig,

  /// Write results next to the originals instead of rewriting them.
  pub dry_run: bool,

  /// Size of the worker pool. Defaults to the number of CPUs.
  pub threads: Option<usize>,

  /// Directory of the loaded config file, or the working directory when no
  /// file was found.
  #[serde(skip)]
  pub config_dir: PathBuf,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_dir: PathBuf::from("."),
      inline_header: None,
      header_path: None,
      additional_headers: Vec::new(),
      strict_check: true,
      use_default_excludes: true,
      use_default_mapping: true,
      case_sensitive: true,
      keywords: vec![DEFAULT_KEYWORD.to_string()],
      includes: Vec::new(),
      excludes: Vec::new(),
      properties: BTreeMap::new(),
      mapping: BTreeMap::new(),
      git: GitConfig::default(),
      dry_run: false,
      threads: None,
      config_dir: PathBuf::from("."),
    }
  }
}

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("Failed to read config file '{path}': {source}")]
  ReadError { path: PathBuf, source: std::io::Error },

  /// The config file contains invalid TOML.
  #[error("Failed to parse config file '{path}': {source}")]
  ParseError { path: PathBuf, source: toml::de::Error },

  /// A header style definition is inconsistent.
  #[error("Invalid header style '{style}': {message}")]
  InvalidHeaderStyle { style: String, message: String },

  /// A header style carries a regular expression that does not compile.
  #[error("Invalid pattern '{pattern}' in header style '{style}': {source}")]
  InvalidRegex {
    style: String,
    pattern: String,
    source: regex::Error,
  },

  #[error("Include pattern '{pattern}' cannot be negated")]
  NegatedInclude { pattern: String },

  /// The user mapping assigns one file name or extension to two styles.
  #[error("'{key}' is mapped to both '{first}' and '{second}'")]
  ConflictingMapping { key: String, first: String, second: String },

  #[error("'{key}' is mapped to unknown header style '{style}'")]
  UnknownStyle { style: String, key: String },

  #[error("No header configured: set either inlineHeader or headerPath")]
  MissingHeaderSource,

  #[error("Base directory '{path}' is not a directory")]
  InvalidBaseDir { path: PathBuf },

  #[error("Property '{key}' must be a string, number, boolean or date")]
  InvalidProperty { key: String },
}

impl Config {
  /// Load configuration from a file.
  ///
  /// # Arguments
  ///
  /// * `path` - Path to the configuration file
  ///
  /// # Returns
  ///
  /// The loaded configuration with `base_dir` resolved against the file's
  /// directory, or an error if the file cannot be read or parsed.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    verbose_log!("Loading config from: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
      path: path.to_path_buf(),
      source: e,
    })?;

    let config_dir = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };
    config.resolve_paths(&config_dir);

    verbose_log!(
      "Loaded config with {} includes, {} excludes and {} mapped styles",
      config.includes.len(),
      config.excludes.len(),
      config.mapping.len()
    );

    Ok(config)
  }

  /// Anchors `base_dir` to `config_dir`.
  pub fn resolve_paths(&mut self, config_dir: &Path) {
    self.config_dir = config_dir.to_path_buf();
    if self.base_dir.is_relative() {
      self.base_dir = config_dir.join(&self.base_dir);
    }
  }

  /// Validate the configuration.
  ///
  /// Checks that:
  /// - a header source is configured
  /// - no include pattern is negated
  /// - the base directory exists
  /// - every property is a scalar
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.inline_header.is_none() && self.header_path.is_none() {
      return Err(ConfigError::MissingHeaderSource);
    }

    if let Some(pattern) = self.includes.iter().find(|p| p.starts_with('!')) {
      return Err(ConfigError::NegatedInclude {
        pattern: pattern.clone(),
      });
    }

    if !self.base_dir.is_dir() {
      return Err(ConfigError::InvalidBaseDir {
        path: self.base_dir.clone(),
      });
    }

    self.string_properties()?;

    Ok(())
  }

  /// The configured properties as strings.
  ///
  /// Integers, floats, booleans and dates are rendered with their TOML
  /// representation.
  pub fn string_properties(&self) -> Result<BTreeMap<String, String>, ConfigError> {
    self
      .properties
      .iter()
      .map(|(key, value)| {
        let value = match value {
          toml::Value::String(s) => s.clone(),
          toml::Value::Integer(i) => i.to_string(),
          toml::Value::Float(f) => f.to_string(),
          toml::Value::Boolean(b) => b.to_string(),
          toml::Value::Datetime(d) => d.to_string(),
          toml::Value::Array(_) | toml::Value::Table(_) => {
            return Err(ConfigError::InvalidProperty { key: key.clone() });
          }
        };
        Ok((key.clone(), value))
      })
      .collect()
  }

  /// Keywords lowercased, with the default applied when none are set.
  pub fn effective_keywords(&self) -> Vec<String> {
    if self.keywords.is_empty() {
      return vec![DEFAULT_KEYWORD.to_string()];
    }
    self.keywords.iter().map(|k| k.to_lowercase()).collect()
  }

  /// Apply command line overrides on top of the file configuration.
  pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
    if let Some(dry_run) = overrides.dry_run {
      self.dry_run = dry_run;
    }
    if let Some(strict) = overrides.strict_check {
      self.strict_check = strict;
    }
    if let Some(threads) = overrides.threads {
      self.threads = Some(threads);
    }
  }
}

/// Options given on the command line that take precedence over the file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigOverrides {
  pub dry_run: Option<bool>,
  pub strict_check: Option<bool>,
  pub threads: Option<usize>,
}

/// Discover the configuration file path.
///
/// The configuration file is discovered in the following order:
/// 1. Path specified via `--config` flag (passed as `explicit_path`)
/// 2. Path specified via `HEADMARK_CONFIG` environment variable
/// 3. `headmark.toml` in the working directory
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `working_dir` - The directory searched for the default file name
///
/// # Returns
///
/// The path to the configuration file, or `None` if no config file is found.
/// An explicit path is returned even when it does not exist so that loading
/// it reports the error.
pub fn discover_config_path(explicit_path: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
  if let Some(path) = explicit_path {
    verbose_log!("Using explicit config path: {}", path.display());
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
    let path = PathBuf::from(&env_path);
    if path.exists() {
      verbose_log!("Using config from {}: {}", CONFIG_ENV_VAR, path.display());
      return Some(path);
    }
    verbose_log!("{} path does not exist: {}", CONFIG_ENV_VAR, env_path);
  }

  let local_config = working_dir.join(DEFAULT_CONFIG_FILENAME);
  if local_config.exists() {
    verbose_log!("Using config: {}", local_config.display());
    return Some(local_config);
  }

  verbose_log!("No config file found");
  None
}

/// Load configuration from the discovered path, or return a default config.
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path from CLI flag
/// * `working_dir` - The directory searched for the default file name and
///   used as base directory when no file is found
///
/// # Returns
///
/// The loaded configuration, or a default configuration rooted at
/// `working_dir` if no config file is found.
pub fn load_config(explicit_path: Option<&Path>, working_dir: &Path) -> Result<Config> {
  match discover_config_path(explicit_path, working_dir) {
    Some(path) => Config::load(&path).with_context(|| format!("Failed to load config from {}", path.display())),
    None => {
      let mut config = Config::default();
      config.resolve_paths(working_dir);
      Ok(config)
    }
  }
}
