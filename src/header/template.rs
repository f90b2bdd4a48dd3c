//! # Header Template
//!
//! Renders the configured header text in a given [`HeaderStyle`] and checks
//! whether a file already carries it.
//!
//! Two checks are available. The strict check looks for the rendered header,
//! ignoring trailing spaces only. The lenient check strips the comment
//! decorations and all whitespace from both sides, so a re-wrapped header
//! still matches.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::header::style::{EOL, HeaderStyle};

/// Property values substituted for `${key}` references.
pub type Properties = BTreeMap<String, String>;

/// Property holding the name of the file being processed.
pub const FILENAME_PROPERTY: &str = "headmark.filename";

/// Lines read past the header length when looking for it in a file.
const EXTRA_LINES: usize = 10;

static TRAILING_SPACES: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(" *\r?\n").expect("trailing spaces regex must compile"));

/// Errors raised while rendering a header.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
  /// A property refers to itself, directly or through other properties.
  #[error("Property '{key}' references itself: {chain}")]
  PropertyCycle { key: String, chain: String },
}

/// The header text, split into the forms used for rendering and matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderContent {
  lines: Vec<String>,
  one_line: String,
  max_len: usize,
}

impl HeaderContent {
  pub fn new(text: &str) -> Self {
    let lines: Vec<String> = text.lines().map(ToString::to_string).collect();
    let max_len = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    Self {
      one_line: text.split_whitespace().collect(),
      lines,
      max_len,
    }
  }

  /// Decorates every line with the style's comment syntax.
  ///
  /// Properties are not substituted; see [`HeaderContent::render`].
  pub fn decorate(&self, style: &HeaderStyle) -> String {
    let mut result = String::new();

    push_delimiter(&mut result, &style.first_line);

    for line in &self.lines {
      let this_line = if style.pad_lines {
        let width = self.max_len;
        format!("{}{line:<width$}{}", style.before_each_line, style.after_each_line)
      } else {
        format!("{}{line}{}", style.before_each_line, style.after_each_line)
      };
      result.push_str(this_line.trim_end());
      result.push_str(EOL);
    }

    push_delimiter(&mut result, &style.end_line);

    result
  }

  /// Renders the header for `style` with `properties` substituted.
  ///
  /// # Parameters
  ///
  /// * `style` - Header style of the target file
  /// * `properties` - Values for `${key}` references
  ///
  /// # Returns
  ///
  /// The text to insert at the header position of the file.
  pub fn render(&self, style: &HeaderStyle, properties: &Properties) -> Result<String, TemplateError> {
    substitute_properties(&self.decorate(style), properties)
  }

  /// Tells if `file_text` carries the rendered header.
  ///
  /// # Parameters
  ///
  /// * `file_text` - Content of the file, line endings normalized or not
  /// * `style` - Header style of the file
  /// * `properties` - Values for `${key}` references
  /// * `strict` - Compare line by line instead of ignoring whitespace
  pub fn is_present(
    &self,
    file_text: &str,
    style: &HeaderStyle,
    properties: &Properties,
    strict: bool,
  ) -> Result<bool, TemplateError> {
    if strict {
      self.is_present_strict(file_text, style, properties)
    } else {
      self.is_present_lenient(file_text, style, properties)
    }
  }

  fn first_lines<'a>(&self, file_text: &'a str) -> Vec<&'a str> {
    file_text.lines().take(self.lines.len() + EXTRA_LINES).collect()
  }

  fn is_present_strict(
    &self,
    file_text: &str,
    style: &HeaderStyle,
    properties: &Properties,
  ) -> Result<bool, TemplateError> {
    let mut file_header = self.first_lines(file_text).join("\n");
    file_header.push_str("\n\n");
    let file_header = TRAILING_SPACES.replace_all(&file_header, "\n");

    let expected = self.render(style, properties)?;
    let expected = TRAILING_SPACES.replace_all(&expected, "\n");

    Ok(file_header.contains(expected.as_ref()))
  }

  fn is_present_lenient(
    &self,
    file_text: &str,
    style: &HeaderStyle,
    properties: &Properties,
  ) -> Result<bool, TemplateError> {
    let mut file_header = self.first_lines(file_text).join("").trim().to_string();
    for decoration in [
      &style.first_line,
      &style.end_line,
      &style.before_each_line,
      &style.after_each_line,
    ] {
      let decoration = decoration.trim();
      if !decoration.is_empty() {
        file_header = file_header.replace(decoration, "");
      }
    }
    let file_header: String = file_header.split_whitespace().collect();

    let expected: String = substitute_properties(&self.one_line, properties)?
      .split_whitespace()
      .collect();

    Ok(file_header.contains(&expected))
  }
}

fn push_delimiter(result: &mut String, delimiter: &str) {
  if delimiter.is_empty() {
    return;
  }
  result.push_str(delimiter);
  if delimiter != EOL {
    result.push_str(EOL);
  }
}

/// Replaces `${key}` references with property values.
///
/// Values are expanded recursively. References to unknown keys are kept
/// verbatim.
///
/// # Errors
///
/// Returns [`TemplateError::PropertyCycle`] when a value refers back to a key
/// being expanded.
pub fn substitute_properties(text: &str, properties: &Properties) -> Result<String, TemplateError> {
  let mut stack = Vec::new();
  expand(text, properties, &mut stack)
}

fn expand<'a>(text: &str, properties: &'a Properties, stack: &mut Vec<&'a str>) -> Result<String, TemplateError> {
  let mut result = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(start) = rest.find("${") {
    result.push_str(&rest[..start]);
    let after = &rest[start + 2..];
    let Some(close) = after.find('}') else {
      result.push_str(&rest[start..]);
      return Ok(result);
    };

    let key = &after[..close];
    match properties.get_key_value(key) {
      Some((key, value)) => {
        if stack.contains(&key.as_str()) {
          let mut chain: Vec<&str> = stack.clone();
          chain.push(key);
          return Err(TemplateError::PropertyCycle {
            key: key.clone(),
            chain: chain.join(" -> "),
          });
        }
        stack.push(key);
        result.push_str(&expand(value, properties, stack)?);
        stack.pop();
      }
      None => result.push_str(&rest[start..start + 2 + close + 1]),
    }
    rest = &after[close + 1..];
  }

  result.push_str(rest);
  Ok(result)
}
