//! # Header Module
//!
//! Everything about license headers themselves:
//!
//! * [`style`] - comment syntaxes headers are written in
//! * [`parser`] - locating an existing header in a file
//! * [`template`] - rendering the configured header and matching it

pub mod parser;
pub mod style;
pub mod template;

pub use parser::{FileContent, ParsedHeader, parse_header};
pub use style::{HeaderStyle, StyleRegistry};
pub use template::{HeaderContent, Properties, TemplateError};
