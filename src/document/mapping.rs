//! # Style Mapping
//!
//! Maps file names to header style ids. An exact file name mapping always wins
//! over an extension mapping; among extensions the longest one matching the
//! end of the file name wins, so `foo.cmake.in` prefers `cmake.in` over `in`.
//!
//! Lookups are case insensitive.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::config::{ConfigError, MappingConfig};
use crate::header::style::StyleRegistry;

/// One file name or extension assigned to a header style.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mapping {
  /// Matches files whose name ends with `.{extension}`.
  Extension { extension: String, style: String },
  /// Matches files with exactly this name.
  Filename { filename: String, style: String },
}

impl Mapping {
  pub fn extension(extension: &str, style: &str) -> Self {
    Self::Extension {
      extension: normalize_extension(extension),
      style: style.to_lowercase(),
    }
  }

  pub fn filename(filename: &str, style: &str) -> Self {
    Self::Filename {
      filename: filename.to_lowercase(),
      style: style.to_lowercase(),
    }
  }

  /// The style id this entry maps to.
  pub fn style(&self) -> &str {
    match self {
      Self::Extension { style, .. } | Self::Filename { style, .. } => style,
    }
  }

  /// The lowercase extension or file name.
  pub fn key(&self) -> &str {
    match self {
      Self::Extension { extension, .. } => extension,
      Self::Filename { filename, .. } => filename,
    }
  }

  /// The style id if this entry applies to `filename` (already lowercase).
  pub fn resolve(&self, filename: &str) -> Option<&str> {
    match self {
      Self::Extension { extension, style } => {
        let matches = filename
          .strip_suffix(extension.as_str())
          .is_some_and(|stem| stem.ends_with('.'));
        matches.then_some(style.as_str())
      }
      Self::Filename { filename: name, style } => (name == filename).then_some(style.as_str()),
    }
  }
}

fn normalize_extension(extension: &str) -> String {
  extension.trim_start_matches('.').to_lowercase()
}

/// Built-in mapping as `(style, extensions, filenames)`.
const DEFAULT_MAPPING: &[(&str, &[&str], &[&str])] = &[
  ("asciidoc_style", &["adoc"], &[]),
  ("asp", &["asp"], &[]),
  ("batch", &["bat", "cmd"], &[]),
  ("bracesstar_style", &["pas"], &[]),
  ("doubledashes_style", &["adb", "ads", "e", "sql"], &[]),
  ("doubleslash_style", &["rs"], &[]),
  ("doubletilde_style", &["apt"], &[]),
  ("dynascript_style", &["jsp"], &[]),
  ("dynascript3_style", &["cfc", "cfm"], &[]),
  ("exclamation_style", &["f"], &[]),
  ("exclamation3_style", &["el"], &[]),
  ("ftl", &["ftl"], &[]),
  ("haml_style", &["bas", "haml", "scaml"], &[]),
  (
    "javadoc_style",
    &["aj", "as", "c", "cc", "cpp", "cs", "css", "h", "scss"],
    &[],
  ),
  ("lua", &["lua"], &[]),
  ("mustache_style", &["mustache"], &[]),
  ("mvel_style", &["mv"], &[]),
  ("percent_style", &["cls", "sty", "tex"], &[]),
  ("percent3_style", &["erl", "hrl"], &[]),
  ("php", &["php"], &[]),
  (
    "script_style",
    &["pl", "pm", "properties", "py", "rb", "sh", "toml", "yaml", "yml"],
    &["dockerfile", ".editorconfig", "spring.factories"],
  ),
  ("semicolon_style", &["asm", "clj", "cljs"], &[]),
  ("sharpstar_style", &["vm"], &[]),
  (
    "slashstar_style",
    &["fx", "go", "groovy", "java", "js", "kt", "scala", "ts"],
    &[],
  ),
  ("text", &["txt"], &[]),
  ("apostrophe_style", &["vba"], &[]),
  (
    "xml_style",
    &[
      "dtd", "fml", "gsp", "htm", "html", "jspx", "kml", "mxml", "pom", "tagx", "tld", "wsdl", "xhtml", "xml", "xsd",
      "xsl", "xslt",
    ],
    &[],
  ),
];

/// The built-in mapping entries.
pub fn default_mapping() -> Vec<Mapping> {
  DEFAULT_MAPPING
    .iter()
    .flat_map(|(style, extensions, filenames)| {
      let extensions = extensions.iter().map(move |ext| Mapping::extension(ext, style));
      let filenames = filenames.iter().map(move |name| Mapping::filename(name, style));
      extensions.chain(filenames)
    })
    .collect()
}

/// Lookup table from file name to style id.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
  filenames: HashMap<String, String>,
  extensions: HashMap<String, String>,
}

impl MappingTable {
  /// Builds the table from the configured mapping.
  ///
  /// # Parameters
  ///
  /// * `mapping` - Style id to extensions and file names, from the config
  /// * `use_default_mapping` - Add the built-in entries not overridden by the
  ///   config
  /// * `registry` - Known styles; every entry must name one of them
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::ConflictingMapping`] if the config maps one key to
  /// two styles, and [`ConfigError::UnknownStyle`] if it names a style that
  /// does not exist.
  pub fn build(
    mapping: &BTreeMap<String, MappingConfig>,
    use_default_mapping: bool,
    registry: &StyleRegistry,
  ) -> Result<Self, ConfigError> {
    let mut table = Self::default();

    for (style, entries) in mapping {
      let user_entries = entries
        .extensions
        .iter()
        .map(|ext| Mapping::extension(ext, style))
        .chain(entries.filenames.iter().map(|name| Mapping::filename(name, style)));

      for entry in user_entries {
        if !registry.contains(entry.style()) {
          return Err(ConfigError::UnknownStyle {
            style: entry.style().to_string(),
            key: entry.key().to_string(),
          });
        }
        table.insert_user(entry)?;
      }
    }

    if use_default_mapping {
      for entry in default_mapping() {
        table.insert_default(entry);
      }
    }

    debug!(
      "Mapping table has {} file names and {} extensions",
      table.filenames.len(),
      table.extensions.len()
    );
    Ok(table)
  }

  fn slot(&mut self, entry: &Mapping) -> Entry<'_, String, String> {
    match entry {
      Mapping::Extension { extension, .. } => self.extensions.entry(extension.clone()),
      Mapping::Filename { filename, .. } => self.filenames.entry(filename.clone()),
    }
  }

  fn insert_user(&mut self, entry: Mapping) -> Result<(), ConfigError> {
    let style = entry.style().to_string();
    match self.slot(&entry) {
      Entry::Occupied(existing) if *existing.get() != style => Err(ConfigError::ConflictingMapping {
        key: existing.key().clone(),
        first: existing.get().clone(),
        second: style,
      }),
      Entry::Occupied(_) => Ok(()),
      Entry::Vacant(slot) => {
        slot.insert(style);
        Ok(())
      }
    }
  }

  fn insert_default(&mut self, entry: Mapping) {
    let style = entry.style().to_string();
    match self.slot(&entry) {
      Entry::Occupied(existing) => {
        debug!("Default mapping for {} is overridden by {}", existing.key(), existing.get());
      }
      Entry::Vacant(slot) => {
        slot.insert(style);
      }
    }
  }

  /// Resolves the style id for a file name.
  ///
  /// # Returns
  ///
  /// The mapped style id, or `None` when the file is not mapped.
  pub fn resolve(&self, filename: &str) -> Option<&str> {
    let filename = filename.to_lowercase();
    if let Some(style) = self.filenames.get(&filename) {
      return Some(style);
    }

    // every suffix after a dot, longest first
    filename
      .match_indices('.')
      .map(|(i, _)| &filename[i + 1..])
      .find_map(|extension| self.extensions.get(extension))
      .map(String::as_str)
  }
}
