//! # Document Module
//!
//! A [`Document`] is one selected file loaded in memory together with its
//! header style and the location of its existing header. Documents are made
//! by a [`DocumentFactory`], which resolves the style from the file name.

pub mod mapping;

use std::path::{Path, PathBuf};

pub use mapping::{Mapping, MappingTable, default_mapping};
use tracing::trace;

use crate::git::GitHistory;
use crate::header::parser::{FileContent, ParsedHeader, parse_header};
use crate::header::style::{HeaderStyle, StyleRegistry};
use crate::header::template::{FILENAME_PROPERTY, HeaderContent, Properties, TemplateError};

/// Line separator found in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
  Lf,
  CrLf,
}

impl LineEnding {
  /// CRLF when the first line break of `text` is one.
  pub fn detect(text: &str) -> Self {
    match text.find('\n') {
      Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => Self::CrLf,
      _ => Self::Lf,
    }
  }

  /// Converts `\n` separated text to this line ending.
  fn apply(self, text: String) -> String {
    match self {
      Self::Lf => text,
      Self::CrLf => text.replace('\n', "\r\n"),
    }
  }
}

/// A file being checked or rewritten.
#[derive(Debug)]
pub struct Document<'a> {
  pub path: PathBuf,
  style: &'a HeaderStyle,
  content: FileContent,
  header: ParsedHeader,
  line_ending: LineEnding,
  properties: Properties,
}

impl<'a> Document<'a> {
  /// Parses `text` for an existing header.
  pub fn new(path: PathBuf, text: &str, style: &'a HeaderStyle, keywords: &[String], properties: Properties) -> Self {
    let line_ending = LineEnding::detect(text);
    let mut content = FileContent::new(text);
    let header = parse_header(&mut content, style, keywords);
    trace!("Parsed {}: {:?}", path.display(), header);

    Self {
      path,
      style,
      content,
      header,
      line_ending,
      properties,
    }
  }

  pub const fn parsed_header(&self) -> &ParsedHeader {
    &self.header
  }

  /// A header containing the keywords was found.
  pub const fn existing_header(&self) -> bool {
    self.header.existing_header
  }

  /// The span of an existing header is known.
  pub const fn header_detected(&self) -> bool {
    self.header.header_detected()
  }

  /// Tells if the document already carries `header`.
  pub fn header_matches(&self, header: &HeaderContent, strict: bool) -> Result<bool, TemplateError> {
    header.is_present(self.content.as_str(), self.style, &self.properties, strict)
  }

  /// Inserts `header` at the header position, using the line ending of the
  /// first line of the file.
  pub fn insert_header(&mut self, header: &HeaderContent) -> Result<(), TemplateError> {
    let rendered = self.line_ending.apply(header.render(self.style, &self.properties)?);
    self.content.insert(self.header.begin, &rendered);
    self.header.end = Some(self.header.begin + rendered.len());
    self.header.existing_header = true;
    Ok(())
  }

  /// Deletes the existing header, if any.
  pub fn remove_header(&mut self) {
    if let Some(end) = self.header.end.take() {
      self.content.delete(self.header.begin, end);
      self.header.existing_header = false;
    }
  }

  /// The content to write back. Lines outside the header keep their own line
  /// endings.
  pub fn output(&self) -> String {
    self.content.as_str().to_string()
  }
}

/// Creates documents for selected files.
#[derive(Debug)]
pub struct DocumentFactory {
  mapping: MappingTable,
  registry: StyleRegistry,
  properties: Properties,
  keywords: Vec<String>,
  git_history: Option<GitHistory>,
}

impl DocumentFactory {
  pub const fn new(
    mapping: MappingTable,
    registry: StyleRegistry,
    properties: Properties,
    keywords: Vec<String>,
  ) -> Self {
    Self {
      mapping,
      registry,
      properties,
      keywords,
      git_history: None,
    }
  }

  /// Adds the `headmark.git.*` properties from `history` to every document.
  pub fn with_git_history(mut self, history: Option<GitHistory>) -> Self {
    self.git_history = history;
    self
  }

  /// The style of `path`, or the `unknown` style when it is not mapped.
  pub fn style_for(&self, path: &Path) -> &HeaderStyle {
    let filename = file_name(path);
    self
      .mapping
      .resolve(&filename)
      .and_then(|id| self.registry.get(id))
      .unwrap_or_else(|| self.registry.unknown())
  }

  /// Builds the document for `path` from its content.
  ///
  /// # Returns
  ///
  /// `None` when the file has no known header style.
  pub fn create_document(&self, path: &Path, text: &str) -> Option<Document<'_>> {
    let style = self.style_for(path);
    if style.is_unknown() {
      return None;
    }

    let mut properties = self.properties.clone();
    properties.insert(FILENAME_PROPERTY.to_string(), file_name(path));
    if let Some(history) = &self.git_history {
      for (key, value) in history.properties(path) {
        properties.insert(key.to_string(), value);
      }
    }

    Some(Document::new(
      path.to_path_buf(),
      text,
      style,
      &self.keywords,
      properties,
    ))
  }
}

fn file_name(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}
