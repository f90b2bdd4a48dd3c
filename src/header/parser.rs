//! # Header Parser
//!
//! Locates an existing header in a file for a given [`HeaderStyle`]. The
//! parser walks the text line by line over a [`FileContent`] buffer, first
//! skipping lines that must stay above the header (shebangs, XML prologs),
//! then recognizing a comment block that starts with the style's first line.
//!
//! The block counts as an existing header only when it contains every
//! configured keyword. Its span `[begin, end)` is then known and can be
//! deleted or replaced.

use crate::header::style::HeaderStyle;

/// Text buffer with a line cursor.
///
/// The text is kept as is, so every line keeps its own line ending; lines
/// handed out by `next_line` have their `\n` or `\r\n` stripped. `rewind`
/// moves the cursor back to the start of the line returned by the last
/// `next_line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
  pos: usize,
  old_pos: usize,
  content: String,
}

impl FileContent {
  pub fn new(text: &str) -> Self {
    Self {
      pos: 0,
      old_pos: 0,
      content: text.to_string(),
    }
  }

  /// Current cursor offset.
  pub const fn pos(&self) -> usize {
    self.pos
  }

  pub const fn reset_to(&mut self, pos: usize) {
    self.old_pos = pos;
    self.pos = pos;
  }

  pub const fn reset(&mut self) {
    self.reset_to(0);
  }

  pub const fn rewind(&mut self) {
    self.pos = self.old_pos;
  }

  pub fn end_reached(&self) -> bool {
    self.pos >= self.content.len()
  }

  /// Returns the next line without its line break, or `None` at the end.
  pub fn next_line(&mut self) -> Option<String> {
    if self.end_reached() {
      return None;
    }

    let rest = &self.content[self.pos..];
    let (line, advance) = match rest.find('\n') {
      Some(lf) => (&rest[..lf], lf + 1),
      None => (rest, rest.len()),
    };
    let line = line.strip_suffix('\r').unwrap_or(line).to_string();

    self.old_pos = self.pos;
    self.pos += advance;
    Some(line)
  }

  pub fn as_str(&self) -> &str {
    &self.content
  }

  pub fn insert(&mut self, index: usize, s: &str) {
    self.content.insert_str(index, s);
  }

  pub fn delete(&mut self, start: usize, end: usize) {
    self.content.drain(start..end);
  }
}

/// Where the header of a file starts and ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
  /// Offset where a header is, or would be inserted.
  pub begin: usize,
  /// End of the existing header span, `None` when there is none.
  pub end: Option<usize>,
  /// A comment block was found and it contains every keyword.
  pub existing_header: bool,
}

impl ParsedHeader {
  /// A header span is known and can be removed or replaced.
  pub const fn header_detected(&self) -> bool {
    self.end.is_some()
  }
}

fn is_blank(line: Option<&String>) -> bool {
  line.is_some_and(|l| l.trim().is_empty())
}

/// Finds the header of `content` for `style`.
///
/// # Parameters
///
/// * `content` - Buffer to scan; its cursor is moved
/// * `style` - Header style of the file
/// * `keywords` - Lowercase words an existing header must contain
///
/// # Returns
///
/// The header span. When no header exists, `begin` is where one should be
/// inserted.
pub fn parse_header(content: &mut FileContent, style: &HeaderStyle, keywords: &[String]) -> ParsedHeader {
  content.reset();
  let mut line = content.next_line();

  let begin = find_begin(&mut line, content, style);
  let existing_header = find_existing_header(&mut line, content, style, keywords);

  let end = existing_header.then(|| {
    let mut end = content.pos();
    line = content.next_line();
    if begin == 0 {
      while is_blank(line.as_ref()) {
        end = content.pos();
        line = content.next_line();
      }
    }
    if style.end_line.ends_with('\n') && is_blank(line.as_ref()) {
      end = content.pos();
    }
    end
  });

  ParsedHeader {
    begin,
    end,
    existing_header,
  }
}

fn find_begin(line: &mut Option<String>, content: &mut FileContent, style: &HeaderStyle) -> usize {
  if style.skip_line_pattern.is_none() {
    return 0;
  }

  let mut begin = 0;
  while line.as_ref().is_some_and(|l| !style.is_skip_line(l)) {
    begin = content.pos();
    *line = content.next_line();
  }

  while line.as_ref().is_some_and(|l| style.is_skip_line(l)) {
    begin = content.pos();
    *line = content.next_line();
  }

  // nothing to skip: the header goes at the top of the file
  if line.is_none() {
    begin = 0;
    content.reset();
    *line = content.next_line();
  }
  begin
}

fn find_existing_header(
  line: &mut Option<String>,
  content: &mut FileContent,
  style: &HeaderStyle,
  keywords: &[String],
) -> bool {
  while is_blank(line.as_ref()) {
    *line = content.next_line();
  }

  let mut in_place_header = match line.as_ref() {
    Some(l) if style.is_first_header_line(l) => l.to_lowercase(),
    _ => return false,
  };

  *line = content.next_line();

  if style.allow_blank_lines {
    while is_blank(line.as_ref()) {
      *line = content.next_line();
    }
  }

  // a lone comment line at the end of the file is not a header
  let Some(second) = line.clone() else {
    return false;
  };
  in_place_header.push_str(&second.to_lowercase());

  let before = match style.before_each_line.trim_end() {
    "" if !style.multiple_lines => style.before_each_line.as_str(),
    trimmed => trimmed,
  };

  let mut found_end = false;
  if (style.multiple_lines && style.is_last_header_line(&second)) || second.trim().is_empty() {
    found_end = true;
  } else {
    loop {
      *line = content.next_line();
      match line.as_ref() {
        Some(l) if l.starts_with(before) => {
          in_place_header.push_str(&l.to_lowercase());
          if style.multiple_lines && style.is_last_header_line(l) {
            found_end = true;
            break;
          }
        }
        _ => break,
      }
    }

    if line.as_ref().is_none_or(|l| l.trim().is_empty()) {
      found_end = true;
    }
  }

  if style.multiple_lines && style.allow_blank_lines && !found_end {
    loop {
      *line = content.next_line();
      if !is_blank(line.as_ref()) {
        break;
      }
    }
    // at the end of the file the last line read is already consumed
    if line.is_some() {
      content.rewind();
    }
  } else if !style.multiple_lines && !found_end {
    content.rewind();
  }

  if style.multiple_lines {
    if line.is_some() {
      // a closing line that does not start with `before`
      let pos = content.pos();
      *line = content.next_line();
      if line.as_ref().is_none_or(|l| !style.is_last_header_line(l)) {
        content.reset_to(pos);
      }
    }
  } else {
    // end line may look like any other header line
    let pos = content.pos();
    while line.as_ref().is_some_and(|l| {
      !style.is_last_header_line(l) && (style.allow_blank_lines || !l.trim().is_empty()) && l.starts_with(before)
    }) {
      *line = content.next_line();
    }
    if line.is_none() {
      content.reset_to(pos);
    }
  }

  keywords.iter().all(|keyword| in_place_header.contains(keyword.as_str()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::header::style::StyleRegistry;

  fn style(id: &str) -> HeaderStyle {
    StyleRegistry::with_defaults()
      .expect("defaults should load")
      .get(id)
      .expect("style should exist")
      .clone()
  }

  fn keywords() -> Vec<String> {
    vec!["copyright".to_string()]
  }

  fn parse(text: &str, id: &str) -> (ParsedHeader, FileContent) {
    let mut content = FileContent::new(text);
    let parsed = parse_header(&mut content, &style(id), &keywords());
    (parsed, content)
  }

  #[test]
  fn test_file_content_lines() {
    let mut content = FileContent::new("one\r\ntwo\nthree");
    assert_eq!(content.as_str(), "one\r\ntwo\nthree");
    assert_eq!(content.next_line().as_deref(), Some("one"));
    assert_eq!(content.pos(), 5);
    assert_eq!(content.next_line().as_deref(), Some("two"));
    content.rewind();
    assert_eq!(content.pos(), 5);
    assert_eq!(content.next_line().as_deref(), Some("two"));
    assert_eq!(content.next_line().as_deref(), Some("three"));
    assert!(content.end_reached());
    assert_eq!(content.next_line(), None);
  }

  #[test]
  fn test_file_content_edit() {
    let mut content = FileContent::new("abc\ndef\n");
    content.insert(0, "first\n");
    assert_eq!(content.as_str(), "first\nabc\ndef\n");
    content.delete(0, 6);
    assert_eq!(content.as_str(), "abc\ndef\n");
  }

  #[test]
  fn test_slashstar_header() {
    let text = "/*\n * Copyright 2024 Acme\n */\n\npackage main;\n";
    let (parsed, content) = parse(text, "slashstar_style");

    assert!(parsed.existing_header);
    assert!(parsed.header_detected());
    assert_eq!(parsed.begin, 0);
    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[end..], "package main;\n");
  }

  #[test]
  fn test_missing_header() {
    let (parsed, _) = parse("package main;\n\nfunc main() {}\n", "slashstar_style");
    assert!(!parsed.existing_header);
    assert!(!parsed.header_detected());
    assert_eq!(parsed.begin, 0);
  }

  #[test]
  fn test_comment_without_keywords_is_not_a_header() {
    let (parsed, _) = parse("/*\n * Just a comment\n */\nint x;\n", "slashstar_style");
    assert!(!parsed.existing_header);
    assert_eq!(parsed.end, None);
  }

  #[test]
  fn test_keywords_are_case_insensitive() {
    let (parsed, _) = parse("/*\n * COPYRIGHT Acme\n */\n", "slashstar_style");
    assert!(parsed.existing_header);
  }

  #[test]
  fn test_single_line_comment_at_end_is_not_a_header() {
    let (parsed, _) = parse("// Copyright Acme", "doubleslash_style");
    assert!(!parsed.existing_header);
    assert_eq!(parsed.end, None);
  }

  #[test]
  fn test_doubleslash_header() {
    let text = "// Copyright 2024 Acme\n// Licensed under MIT\n\nfn main() {}\n";
    let (parsed, content) = parse(text, "doubleslash_style");

    assert!(parsed.existing_header);
    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[parsed.begin..end], "// Copyright 2024 Acme\n// Licensed under MIT\n\n");
  }

  #[test]
  fn test_doubleslash_header_followed_by_code_comment() {
    let text = "// Copyright 2024 Acme\n// Licensed under MIT\n\n// main entry\nfn main() {}\n";
    let (parsed, content) = parse(text, "doubleslash_style");

    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[end..], "// main entry\nfn main() {}\n");
  }

  #[test]
  fn test_script_header_after_shebang() {
    let text = "#!/bin/sh\n\n# Copyright 2024 Acme\n\necho hi\n";
    let (parsed, content) = parse(text, "script_style");

    assert_eq!(parsed.begin, "#!/bin/sh\n".len());
    assert!(parsed.existing_header);
    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[end..], "echo hi\n");
  }

  #[test]
  fn test_script_without_shebang_starts_at_zero() {
    let (parsed, _) = parse("echo hi\n", "script_style");
    assert_eq!(parsed.begin, 0);
    assert!(!parsed.existing_header);
  }

  #[test]
  fn test_xml_prolog_is_skipped() {
    let text = "<?xml version=\"1.0\"?>\n<project/>\n";
    let (parsed, _) = parse(text, "xml_style");
    assert!(parsed.begin > 0);
    assert_eq!(parsed.begin, "<?xml version=\"1.0\"?>\n".len());
  }

  #[test]
  fn test_xml_header() {
    let text = "<?xml version=\"1.0\"?>\n<!--\n    Copyright Acme\n\n    Licensed under MIT\n-->\n<project/>\n";
    let (parsed, content) = parse(text, "xml_style");

    assert!(parsed.existing_header);
    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[end..], "<project/>\n");
  }

  #[test]
  fn test_text_header() {
    let text = "====\n    Copyright Acme\n====\n\nsome text\n";
    let (parsed, content) = parse(text, "text");

    assert!(parsed.existing_header);
    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[end..], "some text\n");
  }

  #[test]
  fn test_header_only_file() {
    let text = "/*\n * Copyright Acme\n */\n";
    let (parsed, content) = parse(text, "slashstar_style");
    assert!(parsed.existing_header);
    assert_eq!(parsed.end, Some(content.as_str().len()));
  }

  #[test]
  fn test_crlf_input() {
    let text = "/*\r\n * Copyright Acme\r\n */\r\n\r\nint x;\r\n";
    let (parsed, content) = parse(text, "slashstar_style");
    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[end..], "int x;\r\n");
  }

  #[test]
  fn test_asp_header_only_file() {
    let text = "<%\n' Copyright Acme\n%>\n";
    let (parsed, content) = parse(text, "asp");
    assert!(parsed.existing_header);
    assert_eq!(parsed.end, Some(content.as_str().len()));
  }

  #[test]
  fn test_asp_header_with_body() {
    let text = "<%\n' Copyright Acme\n%>\n\n<html/>\n";
    let (parsed, content) = parse(text, "asp");
    let end = parsed.end.expect("end");
    assert_eq!(&content.as_str()[end..], "<html/>\n");
  }

  #[test]
  fn test_empty_file() {
    let (parsed, _) = parse("", "javadoc_style");
    assert_eq!(
      parsed,
      ParsedHeader {
        begin: 0,
        end: None,
        existing_header: false
      }
    );
  }
}
