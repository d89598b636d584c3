use scraper::Html;
use std::time::Duration;
use thiserror::Error;

use super::{fetch_document, FetchError};
use crate::extract::{clean_element, clean_text, FieldSelector, Match, SelectorError};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Fetches `path` and returns the cleaned first match of `selector`.
///
/// An empty selector returns the document unchanged. A selector that matches
/// nothing, or whose match fails sanitization, returns the empty string.
pub async fn get_content(
    client: &reqwest::Client,
    path: &str,
    selector: &str,
    timeout: Duration,
) -> Result<String, ContentError> {
    let document = fetch_document(client, path, timeout).await?;
    if selector.trim().is_empty() {
        return Ok(document);
    }

    let selector = FieldSelector::parse(selector)?;
    let doc = Html::parse_document(&document);

    let value = match selector.first_match(doc.root_element()) {
        Some(Match::Element(element)) => clean_element(element).unwrap_or_else(|e| {
            tracing::debug!(path = %path, reason = %e, "Matched content failed sanitization");
            String::new()
        }),
        Some(Match::Text(text)) => clean_text(&text),
        Some(Match::Attribute(value)) => clean_text(value),
        None => {
            tracing::debug!(path = %path, "Content selector matched nothing");
            String::new()
        }
    };
    Ok(value)
}
