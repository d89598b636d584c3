//! Field selectors: a CSS selector plus what to take from the matched node.
//!
//! | Selector            | Value                                   |
//! |---------------------|-----------------------------------------|
//! | `div.content`       | sanitized markup of the first match     |
//! | `h2 a::text`        | text content of the first match         |
//! | `h2 a@href`         | `href` attribute of the first match     |
//! | `::text` / `@id`    | text / attribute of the context node    |

use scraper::{ElementRef, Selector};
use thiserror::Error;

const TEXT_SUFFIX: &str = "::text";

#[derive(Debug, Clone, Error)]
pub enum SelectorError {
    #[error("invalid CSS selector `{selector}`: {message}")]
    InvalidCss { selector: String, message: String },

    #[error("empty attribute name in selector `{0}`")]
    EmptyAttribute(String),
}

/// What a field selector reads from its matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Markup,
    Text,
    Attribute(String),
}

/// The value found by a [`FieldSelector`], borrowed from the document.
#[derive(Debug, Clone)]
pub enum Match<'a> {
    Element(ElementRef<'a>),
    Text(String),
    Attribute(&'a str),
}

/// A compiled field selector.
#[derive(Debug, Clone)]
pub struct FieldSelector {
    /// `None` targets the context node itself.
    css: Option<Selector>,
    target: Target,
}

impl FieldSelector {
    /// Parses a selector such as `h2.title a@href` or `div.body::text`.
    pub fn parse(spec: &str) -> Result<Self, SelectorError> {
        let spec = spec.trim();
        let (css, target) = split_target(spec)?;

        let css = if css.is_empty() {
            None
        } else {
            Some(compile_css(css)?)
        };

        Ok(Self { css, target })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Evaluates the selector relative to `node`, returning the first match
    /// in document order.
    pub fn first_match<'a>(&self, node: ElementRef<'a>) -> Option<Match<'a>> {
        let element = match &self.css {
            Some(css) => node.select(css).next()?,
            None => node,
        };

        match &self.target {
            Target::Markup => Some(Match::Element(element)),
            Target::Text => Some(Match::Text(element.text().collect())),
            Target::Attribute(name) => element.value().attr(name).map(Match::Attribute),
        }
    }
}

/// Parses a plain CSS selector (no target suffix).
pub fn compile_css(css: &str) -> Result<Selector, SelectorError> {
    Selector::parse(css).map_err(|e| SelectorError::InvalidCss {
        selector: css.to_owned(),
        message: e.to_string(),
    })
}

fn split_target(spec: &str) -> Result<(&str, Target), SelectorError> {
    if let Some(css) = spec.strip_suffix(TEXT_SUFFIX) {
        return Ok((css.trim_end(), Target::Text));
    }

    // `@` never appears in CSS outside attribute-value strings, so a trailing
    // `@name` with no brackets or quotes after it is an attribute target.
    if let Some((css, attr)) = spec.rsplit_once('@') {
        if !attr.contains([']', '"', '\'', ' ', '>']) {
            if attr.is_empty() {
                return Err(SelectorError::EmptyAttribute(spec.to_owned()));
            }
            return Ok((css.trim_end(), Target::Attribute(attr.to_owned())));
        }
    }

    Ok((spec, Target::Markup))
}
