//! Entry extraction from HTML pages.
//!
//! This module turns a parsed page into raw per-entry field values and then
//! into final field values:
//!
//! - [`extractor`] - Evaluates the context and field selectors
//! - [`selector`] - CSS selectors with `::text` / `@attr` targets
//! - [`sanitize`] - Allowlist-based cleaning of extracted markup
//! - [`template`] - `{{ entry.<field> }}` and `get_content` field templates
//! - [`resolve`] - Template / raw / empty precedence, feed-level fields

mod extractor;
mod resolve;
mod rules;
mod sanitize;
mod selector;
mod template;

use std::collections::BTreeMap;

/// Raw field values of one candidate entry, keyed by field name.
pub type RawFields = BTreeMap<String, String>;

pub use extractor::extract_entries;
pub use resolve::{resolve_field, FeedField};
pub use rules::ExtractionRules;
pub use sanitize::{clean_element, clean_text, SanitizeError};
pub use selector::{compile_css, FieldSelector, Match, SelectorError, Target};
pub use template::{
    content_calls, render as render_template, ContentCall, FetchedContent, TemplateError,
};
