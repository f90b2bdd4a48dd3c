//! # Header Styles
//!
//! A [`HeaderStyle`] describes how a license header is delimited in one comment
//! syntax: the fixed first and last lines, the text wrapped around every header
//! line, and the regular expressions used to recognize an existing header.
//!
//! Styles are kept in a [`StyleRegistry`], built from the bundled
//! `defaults.toml` table and optionally extended with user supplied header
//! style documents in the same format.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ConfigError;

/// Id of the sentinel style assigned to files without a mapping.
pub const UNKNOWN_STYLE: &str = "unknown";

/// Placeholder for the line separator inside style templates.
pub const EOL_PLACEHOLDER: &str = "${eol}";

/// Line separator used when rendering headers.
pub const EOL: &str = "\n";

const DEFAULT_STYLES: &str = include_str!("defaults.toml");

/// Serialized form of a header style, as found in header style documents.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderStyleModel {
  pub first_line: String,
  pub end_line: String,
  pub before_each_line: String,
  pub after_each_line: String,
  pub allow_blank_lines: bool,
  pub multiple_lines: bool,
  pub pad_lines: bool,
  pub skip_line_pattern: Option<String>,
  pub first_line_detection_pattern: Option<String>,
  pub last_line_detection_pattern: Option<String>,
}

impl Default for HeaderStyleModel {
  fn default() -> Self {
    Self {
      first_line: String::new(),
      end_line: String::new(),
      before_each_line: String::new(),
      after_each_line: String::new(),
      allow_blank_lines: false,
      multiple_lines: true,
      pad_lines: false,
      skip_line_pattern: None,
      first_line_detection_pattern: None,
      last_line_detection_pattern: None,
    }
  }
}

/// A validated header style with compiled detection patterns.
#[derive(Debug, Clone)]
pub struct HeaderStyle {
  /// Lowercase style id.
  pub id: String,
  pub first_line: String,
  pub end_line: String,
  pub before_each_line: String,
  pub after_each_line: String,
  /// Only for multi-line styles: blank lines may appear inside the header.
  pub allow_blank_lines: bool,
  /// Whether the header is one comment delimited by a first and last line,
  /// rather than a run of individually commented lines.
  pub multiple_lines: bool,
  /// Pad every header line to the longest one before `after_each_line`.
  pub pad_lines: bool,
  pub skip_line_pattern: Option<Regex>,
  pub first_line_detection_pattern: Option<Regex>,
  pub last_line_detection_pattern: Option<Regex>,
}

impl HeaderStyle {
  /// The sentinel style for files that have no mapping.
  pub fn unknown() -> Self {
    Self {
      id: UNKNOWN_STYLE.to_string(),
      first_line: String::new(),
      end_line: String::new(),
      before_each_line: String::new(),
      after_each_line: String::new(),
      allow_blank_lines: false,
      multiple_lines: false,
      pad_lines: false,
      skip_line_pattern: None,
      first_line_detection_pattern: None,
      last_line_detection_pattern: None,
    }
  }

  /// Builds a style from its serialized form.
  ///
  /// Templates get `${eol}` substituted and detection patterns are anchored so
  /// that they must match a whole line.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::InvalidHeaderStyle`] if a detection pattern is
  /// missing or `allowBlankLines` is set without `multipleLines`, and
  /// [`ConfigError::InvalidRegex`] if a pattern does not compile.
  pub fn from_model(id: &str, model: HeaderStyleModel) -> Result<Self, ConfigError> {
    let id = id.to_lowercase();

    if model.allow_blank_lines && !model.multiple_lines {
      return Err(ConfigError::InvalidHeaderStyle {
        style: id,
        message: "allowBlankLines requires multipleLines".to_string(),
      });
    }
    if model.first_line_detection_pattern.is_none() || model.last_line_detection_pattern.is_none() {
      return Err(ConfigError::InvalidHeaderStyle {
        style: id,
        message: "both firstLineDetectionPattern and lastLineDetectionPattern are required".to_string(),
      });
    }

    let compile = |pattern: Option<String>| -> Result<Option<Regex>, ConfigError> {
      pattern
        .map(|pattern| {
          Regex::new(&format!("^(?:{pattern})$")).map_err(|source| ConfigError::InvalidRegex {
            style: id.clone(),
            pattern,
            source,
          })
        })
        .transpose()
    };

    Ok(Self {
      skip_line_pattern: compile(model.skip_line_pattern)?,
      first_line_detection_pattern: compile(model.first_line_detection_pattern)?,
      last_line_detection_pattern: compile(model.last_line_detection_pattern)?,
      first_line: substitute_eol(&model.first_line),
      end_line: substitute_eol(&model.end_line),
      before_each_line: substitute_eol(&model.before_each_line),
      after_each_line: substitute_eol(&model.after_each_line),
      allow_blank_lines: model.allow_blank_lines,
      multiple_lines: model.multiple_lines,
      pad_lines: model.pad_lines,
      id,
    })
  }

  pub fn is_unknown(&self) -> bool {
    self.id == UNKNOWN_STYLE
  }

  /// Tells if the line has to be kept above the header (shebang, XML prolog).
  pub fn is_skip_line(&self, line: &str) -> bool {
    self.skip_line_pattern.as_ref().is_some_and(|p| p.is_match(line))
  }

  pub fn is_first_header_line(&self, line: &str) -> bool {
    self.first_line_detection_pattern.as_ref().is_some_and(|p| p.is_match(line))
  }

  pub fn is_last_header_line(&self, line: &str) -> bool {
    self.last_line_detection_pattern.as_ref().is_some_and(|p| p.is_match(line))
  }
}

fn substitute_eol(template: &str) -> String {
  template.replace(EOL_PLACEHOLDER, EOL)
}

/// Parses a header style document.
///
/// # Parameters
///
/// * `name` - Where the document came from, used in error messages
/// * `content` - TOML table keyed by style id
///
/// # Errors
///
/// Returns a [`ConfigError`] if the document is not valid TOML or any style
/// in it is malformed.
pub fn parse_styles(name: &str, content: &str) -> Result<HashMap<String, HeaderStyle>, ConfigError> {
  let models: HashMap<String, HeaderStyleModel> = toml::from_str(content).map_err(|source| ConfigError::ParseError {
    path: name.into(),
    source,
  })?;

  models
    .into_iter()
    .map(|(id, model)| HeaderStyle::from_model(&id, model).map(|style| (style.id.clone(), style)))
    .collect()
}

/// The built-in styles, without the `unknown` sentinel.
pub fn default_styles() -> Result<HashMap<String, HeaderStyle>, ConfigError> {
  parse_styles("<builtin styles>", DEFAULT_STYLES)
}

/// Immutable lookup table from style id to [`HeaderStyle`].
#[derive(Debug, Clone)]
pub struct StyleRegistry {
  styles: HashMap<String, HeaderStyle>,
}

impl StyleRegistry {
  /// A registry holding only the `unknown` sentinel.
  pub fn empty() -> Self {
    let mut styles = HashMap::new();
    styles.insert(UNKNOWN_STYLE.to_string(), HeaderStyle::unknown());
    Self { styles }
  }

  /// A registry holding the built-in styles.
  pub fn with_defaults() -> Result<Self, ConfigError> {
    let mut registry = Self::empty();
    registry.merge(default_styles()?);
    Ok(registry)
  }

  /// Adds styles, replacing existing ones with the same id.
  ///
  /// The `unknown` sentinel can never be replaced.
  pub fn merge(&mut self, overrides: HashMap<String, HeaderStyle>) {
    for (id, style) in overrides {
      let id = id.to_lowercase();
      if id == UNKNOWN_STYLE {
        warn!("Ignoring header style override for the reserved '{}' style", UNKNOWN_STYLE);
        continue;
      }
      match self.styles.entry(id) {
        Entry::Occupied(mut entry) => {
          debug!("Header style {} is overridden", entry.key());
          entry.insert(style);
        }
        Entry::Vacant(entry) => {
          entry.insert(style);
        }
      }
    }
  }

  /// Looks up a style by case-insensitive id.
  pub fn get(&self, id: &str) -> Option<&HeaderStyle> {
    self.styles.get(&id.to_lowercase())
  }

  pub fn contains(&self, id: &str) -> bool {
    self.get(id).is_some()
  }

  pub fn unknown(&self) -> &HeaderStyle {
    // the sentinel is inserted on construction and never removed
    self.styles.get(UNKNOWN_STYLE).unwrap_or(&*UNKNOWN)
  }

  pub fn len(&self) -> usize {
    self.styles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.styles.is_empty()
  }
}

static UNKNOWN: LazyLock<HeaderStyle> = LazyLock::new(HeaderStyle::unknown);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_styles_load() {
    let registry = StyleRegistry::with_defaults().expect("defaults should load");
    // 33 built-in styles plus the sentinel
    assert_eq!(registry.len(), 34);
    for id in ["javadoc_style", "script_style", "xml_style", "doubleslash_style", "text", "unknown"] {
      assert!(registry.contains(id), "missing {id}");
    }
  }

  #[test]
  fn test_lookup_is_case_insensitive() {
    let registry = StyleRegistry::with_defaults().expect("defaults should load");
    assert!(registry.get("SLASHSTAR_STYLE").is_some());
    assert!(registry.get("Text").is_some());
  }

  #[test]
  fn test_eol_is_substituted() {
    let registry = StyleRegistry::with_defaults().expect("defaults should load");
    let xml = registry.get("xml_style").expect("xml_style");
    assert_eq!(xml.first_line, "<!--\n");
    assert_eq!(xml.end_line, "\n-->");
    let script = registry.get("script_style").expect("script_style");
    assert_eq!(script.end_line, "\n");
    assert!(!script.multiple_lines);
  }

  #[test]
  fn test_detection_patterns_match_whole_lines() {
    let registry = StyleRegistry::with_defaults().expect("defaults should load");
    let script = registry.get("script_style").expect("script_style");
    assert!(script.is_first_header_line("# Copyright"));
    assert!(!script.is_first_header_line("x = 1 # trailing comment"));
    assert!(script.is_skip_line("#!/usr/bin/env python3"));

    let xml = registry.get("xml_style").expect("xml_style");
    assert!(xml.is_skip_line("<?xml version=\"1.0\"?>"));
    assert!(xml.is_first_header_line("  <!--"));
    assert!(xml.is_last_header_line("-->"));
  }

  #[test]
  fn test_blank_lines_require_multiple_lines() {
    let model = HeaderStyleModel {
      allow_blank_lines: true,
      multiple_lines: false,
      first_line_detection_pattern: Some("#.*".to_string()),
      last_line_detection_pattern: Some("#.*".to_string()),
      ..HeaderStyleModel::default()
    };
    let err = HeaderStyle::from_model("bad", model).expect_err("should be rejected");
    assert!(matches!(err, ConfigError::InvalidHeaderStyle { .. }));
  }

  #[test]
  fn test_detection_patterns_are_required() {
    let model = HeaderStyleModel {
      first_line: "#".to_string(),
      first_line_detection_pattern: Some("#.*".to_string()),
      ..HeaderStyleModel::default()
    };
    let err = HeaderStyle::from_model("half", model).expect_err("should be rejected");
    assert!(matches!(err, ConfigError::InvalidHeaderStyle { .. }));
  }

  #[test]
  fn test_invalid_regex() {
    let content = concat!(
      "[broken]\n",
      "firstLineDetectionPattern = '(unclosed'\n",
      "lastLineDetectionPattern = '.*'\n",
    );
    let err = parse_styles("broken.toml", content).expect_err("should be rejected");
    assert!(matches!(err, ConfigError::InvalidRegex { .. }));
  }

  #[test]
  fn test_merge_overrides_and_adds() {
    let mut registry = StyleRegistry::with_defaults().expect("defaults should load");
    let before = registry.len();
    let content = concat!(
      "[SCRIPT_STYLE]\n",
      "beforeEachLine = \"## \"\n",
      "endLine = \"${eol}\"\n",
      "firstLineDetectionPattern = '##.*$'\n",
      "lastLineDetectionPattern = '##.*$'\n",
      "multipleLines = false\n",
      "\n",
      "[my_style]\n",
      "firstLine = \"(*\"\n",
      "beforeEachLine = \" * \"\n",
      "endLine = \" *)\"\n",
      "firstLineDetectionPattern = '\\(\\*.*$'\n",
      "lastLineDetectionPattern = '.*\\*\\)$'\n",
    );
    registry.merge(parse_styles("extra.toml", content).expect("valid styles"));

    assert_eq!(registry.len(), before + 1);
    assert_eq!(registry.get("script_style").expect("script").before_each_line, "## ");
    assert_eq!(registry.get("my_style").expect("custom").end_line, " *)");
  }

  #[test]
  fn test_unknown_cannot_be_replaced() {
    let mut registry = StyleRegistry::empty();
    let mut overrides = HashMap::new();
    let mut fake = HeaderStyle::unknown();
    fake.first_line = "#".to_string();
    overrides.insert("UNKNOWN".to_string(), fake);
    registry.merge(overrides);
    assert!(registry.unknown().first_line.is_empty());
    assert!(registry.unknown().is_unknown());
  }
}
