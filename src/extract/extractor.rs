use scraper::{ElementRef, Html};
use thiserror::Error;

use super::sanitize::{clean_element, clean_text, SanitizeError};
use super::selector::{compile_css, FieldSelector, Match, SelectorError};
use super::{ExtractionRules, RawFields};

/// Why a single field came out empty. Never escapes this module; it only
/// feeds the debug log.
#[derive(Debug, Error)]
enum FieldError {
    #[error("selector matched nothing")]
    NoMatch,
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Sanitize(#[from] SanitizeError),
}

/// Extracts raw field values for every node matched by the context selector.
///
/// Entries come back in document order. Every configured field is present in
/// each mapping; a field whose selector is invalid, matches nothing, or
/// yields content that fails sanitization maps to the empty string. An
/// invalid context selector or a page without matches yields no entries.
pub fn extract_entries(doc: &Html, rules: &ExtractionRules) -> Vec<RawFields> {
    let context = match compile_css(rules.context()) {
        Ok(sel) => sel,
        Err(e) => {
            tracing::warn!(error = %e, "Context selector is invalid, no entries extracted");
            return Vec::new();
        }
    };

    let selectors: Vec<(&str, Result<FieldSelector, SelectorError>)> = rules
        .fields()
        .iter()
        .map(|(name, spec)| {
            let compiled = FieldSelector::parse(spec);
            if let Err(e) = &compiled {
                tracing::warn!(field = %name, error = %e, "Field selector is invalid, field will be empty");
            }
            (name.as_str(), compiled)
        })
        .collect();

    let entries: Vec<RawFields> = doc
        .select(&context)
        .map(|node| extract_node(node, &selectors))
        .collect();

    tracing::debug!(
        context = %rules.context(),
        matches = entries.len(),
        "Extracted candidate entries"
    );
    entries
}

fn extract_node(
    node: ElementRef<'_>,
    selectors: &[(&str, Result<FieldSelector, SelectorError>)],
) -> RawFields {
    selectors
        .iter()
        .map(|(name, selector)| {
            let value = match selector {
                Ok(selector) => extract_field(node, selector),
                Err(e) => Err(FieldError::Selector(e.clone())),
            };
            let value = value.unwrap_or_else(|e| {
                tracing::debug!(field = %name, reason = %e, "Field falls back to empty string");
                String::new()
            });
            (name.to_string(), value)
        })
        .collect()
}

fn extract_field(node: ElementRef<'_>, selector: &FieldSelector) -> Result<String, FieldError> {
    match selector.first_match(node).ok_or(FieldError::NoMatch)? {
        Match::Element(element) => Ok(clean_element(element)?),
        Match::Text(text) => Ok(clean_text(&text)),
        Match::Attribute(value) => Ok(clean_text(value)),
    }
}
