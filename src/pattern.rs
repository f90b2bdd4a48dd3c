//! # Pattern Module
//!
//! Ant-style path patterns used to select files.
//!
//! A pattern is compiled once into a list of `/`-separated segments and then
//! matched against candidate paths segment by segment:
//!
//! - `*` matches any run of characters inside one segment
//! - `?` matches exactly one character inside one segment
//! - `**` matches any number of whole segments, including none
//!
//! Patterns that do not start with `/` match at any depth, and every pattern
//! also matches everything below what it names (`build` matches
//! `build/out.txt`). A trailing `/` restricts the pattern to directories.
//!
//! A leading `!` marks the pattern as reversed. The flag is only recorded here;
//! [`crate::selection::Selector`] is responsible for acting on it.

use std::fmt;

const DOUBLE_STAR: &str = "**";

/// A compiled, immutable path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
  origin: String,
  segments: Vec<String>,
  reverse: bool,
  dir_only: bool,
  case_sensitive: bool,
}

impl PathPattern {
  /// Compiles a case-sensitive pattern.
  pub fn compile(pattern: &str) -> Self {
    Self::compile_with(pattern, true)
  }

  /// Compiles a pattern with the given case sensitivity.
  ///
  /// # Parameters
  ///
  /// * `pattern` - The glob, optionally prefixed with `!`
  /// * `case_sensitive` - Whether literal characters must match exactly
  ///
  /// # Returns
  ///
  /// The compiled pattern. Compilation never fails: every string is a valid
  /// pattern.
  pub fn compile_with(pattern: &str, case_sensitive: bool) -> Self {
    let (reverse, body) = match pattern.strip_prefix('!') {
      Some(rest) => (true, rest),
      None => (false, pattern),
    };
    let dir_only = body.ends_with('/') || body.ends_with("/**");

    let mut fixed = match body.strip_prefix('/') {
      Some(rest) => rest.to_string(),
      None => format!("{DOUBLE_STAR}/{body}"),
    };
    if fixed.ends_with('/') {
      fixed.push_str(DOUBLE_STAR);
    } else {
      fixed.push('/');
      fixed.push_str(DOUBLE_STAR);
    }

    Self {
      origin: pattern.to_string(),
      segments: split_segments(&fixed).map(str::to_string).collect(),
      reverse,
      dir_only,
      case_sensitive,
    }
  }

  /// Whether the pattern was written with a leading `!`.
  pub const fn is_reverse(&self) -> bool {
    self.reverse
  }

  /// Tells if some path below the directory `dir` could match the pattern.
  ///
  /// The answer errs on the side of `true`: any `**` before the end of `dir`
  /// is assumed to match.
  pub fn may_match_below(&self, dir: &str) -> bool {
    for (i, segment) in split_segments(dir).enumerate() {
      match self.segments.get(i) {
        Some(pattern) if pattern == DOUBLE_STAR => return true,
        Some(pattern) if self.matches_segment(pattern, segment) => {}
        // the pattern names an ancestor of `dir`, which covers its contents
        None => return true,
        Some(_) => return false,
      }
    }
    true
  }

  /// Tests a `/`-separated relative path against the pattern.
  ///
  /// The result is the structural match only; it is never negated for
  /// reversed patterns.
  ///
  /// # Parameters
  ///
  /// * `path` - Candidate path relative to the selection root
  /// * `is_dir` - Whether the candidate is a directory
  pub fn matches(&self, path: &str, is_dir: bool) -> bool {
    let candidate: Vec<&str> = split_segments(path).collect();
    self.matches_segments(&candidate, is_dir)
  }

  fn matches_segments(&self, candidate: &[&str], is_dir: bool) -> bool {
    let pattern = &self.segments;
    let mut pat_start = 0;
    let mut pat_end = pattern.len();
    let mut str_start = 0;
    let mut str_end = candidate.len();

    // leading segments up to the first `**`
    while pat_start < pat_end && str_start < str_end {
      let segment = &pattern[pat_start];
      if segment == DOUBLE_STAR {
        break;
      }
      if !self.matches_segment(segment, candidate[str_start]) {
        return false;
      }
      pat_start += 1;
      str_start += 1;
    }
    if str_start == str_end {
      return self.matches_exhausted(&pattern[pat_start..pat_end], is_dir);
    }
    if pat_start == pat_end {
      return false;
    }

    // trailing segments back to the last `**`
    while pat_start < pat_end && str_start < str_end {
      let segment = &pattern[pat_end - 1];
      if segment == DOUBLE_STAR {
        break;
      }
      if !self.matches_segment(segment, candidate[str_end - 1]) {
        return false;
      }
      pat_end -= 1;
      str_end -= 1;
    }
    if str_start == str_end {
      return self.matches_exhausted(&pattern[pat_start..pat_end], is_dir);
    }

    // pattern[pat_start] and pattern[pat_end - 1] are both `**` from here on
    while pat_start + 1 < pat_end && str_start < str_end {
      let Some(offset) = pattern[pat_start + 1..pat_end].iter().position(|s| s == DOUBLE_STAR) else {
        break;
      };
      let next = pat_start + 1 + offset;
      if next == pat_start + 1 {
        // `**/**`
        pat_start += 1;
        continue;
      }

      let run = &pattern[pat_start + 1..next];
      let window = &candidate[str_start..str_end];
      let Some(found) = find_run(window, run.len(), |i, j| self.matches_segment(&run[j], window[i + j])) else {
        return false;
      };

      pat_start = next;
      str_start += found + run.len();
    }

    if str_start == str_end {
      return self.matches_exhausted(&pattern[pat_start..pat_end], is_dir);
    }

    true
  }

  fn matches_exhausted(&self, rest: &[String], is_dir: bool) -> bool {
    if rest.is_empty() {
      return true;
    }
    if rest.iter().all(|s| s == DOUBLE_STAR) {
      return !self.dir_only || is_dir;
    }
    false
  }

  fn matches_segment(&self, pattern: &str, segment: &str) -> bool {
    wildcard_match(pattern, segment, self.case_sensitive)
  }
}

impl fmt::Display for PathPattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.origin)
  }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
  path.split('/').filter(|s| !s.is_empty())
}

/// Finds the first offset where `len` consecutive elements of `window`
/// satisfy `matches(offset, index_in_run)`.
fn find_run(window: &[impl Sized], len: usize, matches: impl Fn(usize, usize) -> bool) -> Option<usize> {
  if len > window.len() {
    return None;
  }
  (0..=window.len() - len).find(|&i| (0..len).all(|j| matches(i, j)))
}

/// Matches a single path segment against a pattern made of literal
/// characters, `?` and `*`.
pub fn wildcard_match(pattern: &str, text: &str, case_sensitive: bool) -> bool {
  let pat: Vec<char> = pattern.chars().collect();
  let txt: Vec<char> = text.chars().collect();
  let same = |p: char, c: char| {
    p == '?' || p == c || (!case_sensitive && p.to_lowercase().eq(c.to_lowercase()))
  };

  if !pat.contains(&'*') {
    return pat.len() == txt.len() && pat.iter().zip(&txt).all(|(&p, &c)| same(p, c));
  }
  if pat.len() == 1 {
    return true;
  }

  let only_stars = |rest: &[char]| rest.iter().all(|&c| c == '*');
  let (mut ps, mut pe) = (0, pat.len());
  let (mut ts, mut te) = (0, txt.len());

  while pat[ps] != '*' && ts < te {
    if !same(pat[ps], txt[ts]) {
      return false;
    }
    ps += 1;
    ts += 1;
  }
  if ts == te {
    return only_stars(&pat[ps..pe]);
  }

  while pat[pe - 1] != '*' && ts < te {
    if !same(pat[pe - 1], txt[te - 1]) {
      return false;
    }
    pe -= 1;
    te -= 1;
  }
  if ts == te {
    return only_stars(&pat[ps..pe]);
  }

  while ps + 1 < pe && ts < te {
    let Some(offset) = pat[ps + 1..pe].iter().position(|&c| c == '*') else {
      break;
    };
    let next = ps + 1 + offset;
    if next == ps + 1 {
      ps += 1;
      continue;
    }

    let run = &pat[ps + 1..next];
    let window = &txt[ts..te];
    let Some(found) = find_run(window, run.len(), |i, j| same(run[j], window[i + j])) else {
      return false;
    };

    ps = next;
    ts += found + run.len();
  }

  only_stars(&pat[ps..pe])
}
