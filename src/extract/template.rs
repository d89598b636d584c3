//! Field templates.
//!
//! A template is literal text with two kinds of placeholders:
//!
//! - `{{ entry.<field> }}` is replaced by the raw extracted value of `<field>`
//! - `{{ get_content(entry.<field>, "<selector>") }}` is replaced by the
//!   cleaned first match of `<selector>` in the page that `<field>` points to
//!
//! Fields with no extracted value render as the empty string. Rendering is
//! synchronous, so `get_content` pages are fetched beforehand (see
//! [`content_calls`]) and handed to [`render`] as [`FetchedContent`].

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

use super::RawFields;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\{\{\s*(?:",
        r#"get_content\(\s*(?P<call_root>[A-Za-z_][A-Za-z0-9_]*)\.(?P<call_field>[A-Za-z_][A-Za-z0-9_-]*)\s*,\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')\s*\)"#,
        r"|(?P<root>[A-Za-z_][A-Za-z0-9_]*)\.(?P<field>[A-Za-z_][A-Za-z0-9_-]*)",
        r")\s*\}\}",
    ))
    .expect("Failed to compile placeholder regex - this is a bug")
});

const ROOT: &str = "entry";

/// Template syntax this renderer does not understand: expressions,
/// statements and comments.
const OPENERS: [&str; 3] = ["{{", "{%", "{#"];

/// Pages fetched for `get_content` placeholders, keyed by the raw field value
/// (the page path) and the selector.
pub type FetchedContent = BTreeMap<(String, String), String>;

/// One `get_content(entry.<field>, "<selector>")` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCall {
    pub field: String,
    pub selector: String,
}

impl ContentCall {
    /// The [`FetchedContent`] key this call reads for `entry`, or `None` when
    /// the entry has no value for the field.
    pub fn key(&self, entry: &RawFields) -> Option<(String, String)> {
        entry
            .get(&self.field)
            .filter(|path| !path.is_empty())
            .map(|path| (path.clone(), self.selector.clone()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template variable `{0}` (only `entry` is defined)")]
    UnknownVariable(String),

    #[error("malformed placeholder at byte {0}")]
    Malformed(usize),
}

/// Lists the well-formed `get_content` calls in `template`.
pub fn content_calls(template: &str) -> Vec<ContentCall> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| {
            let field = caps.name("call_field")?;
            (caps.name("call_root")?.as_str() == ROOT).then(|| ContentCall {
                field: field.as_str().to_owned(),
                selector: call_selector(&caps).to_owned(),
            })
        })
        .collect()
}

/// Renders `template`, substituting placeholders from `entry` and `fetched`.
///
/// A `get_content` call whose page is missing from `fetched` renders empty.
///
/// # Errors
///
/// - [`TemplateError::UnknownVariable`] for a placeholder rooted at anything
///   other than `entry`
/// - [`TemplateError::Malformed`] for a `{{`, `{%` or `{#` that does not
///   open a valid placeholder
pub fn render(
    template: &str,
    entry: &RawFields,
    fetched: &FetchedContent,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let literal = &template[last..whole.start()];
        check_literal(literal, last)?;
        out.push_str(literal);

        let value = match (caps.name("call_root"), caps.name("call_field")) {
            (Some(root), Some(field)) => {
                check_root(root.as_str())?;
                let call = ContentCall {
                    field: field.as_str().to_owned(),
                    selector: call_selector(&caps).to_owned(),
                };
                call.key(entry).and_then(|key| fetched.get(&key))
            }
            _ => {
                let root = caps.name("root").map_or("", |m| m.as_str());
                check_root(root)?;
                caps.name("field").and_then(|field| entry.get(field.as_str()))
            }
        };
        if let Some(value) = value {
            out.push_str(value);
        }
        last = whole.end();
    }

    let tail = &template[last..];
    check_literal(tail, last)?;
    out.push_str(tail);
    Ok(out)
}

fn call_selector<'h>(caps: &Captures<'h>) -> &'h str {
    caps.name("dq")
        .or_else(|| caps.name("sq"))
        .map_or("", |m| m.as_str())
}

fn check_root(root: &str) -> Result<(), TemplateError> {
    if root == ROOT {
        Ok(())
    } else {
        Err(TemplateError::UnknownVariable(root.to_owned()))
    }
}

fn check_literal(literal: &str, offset: usize) -> Result<(), TemplateError> {
    match OPENERS.iter().filter_map(|opener| literal.find(opener)).min() {
        Some(pos) => Err(TemplateError::Malformed(offset + pos)),
        None => Ok(()),
    }
}
