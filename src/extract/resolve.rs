use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::sanitize::clean_text;
use super::template::{render, FetchedContent, TemplateError};
use super::RawFields;

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("Failed to parse title selector - this is a bug")
});

static HTML_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("html").expect("Failed to parse html selector - this is a bug")
});

/// Resolves the final value of an entry field.
///
/// A template for `name` wins and is rendered with `raw` as its `entry`
/// context and `fetched` as the pages behind its `get_content` calls;
/// otherwise the raw value is used verbatim; otherwise the field is empty.
/// Template errors are returned, not swallowed.
pub fn resolve_field(
    name: &str,
    templates: &BTreeMap<String, String>,
    raw: &RawFields,
    fetched: &FetchedContent,
) -> Result<String, TemplateError> {
    if let Some(template) = templates.get(name) {
        return render(template, raw, fetched);
    }
    Ok(raw.get(name).cloned().unwrap_or_default())
}

/// Feed-level fields that can be read from the page itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedField {
    Title,
    Lang,
}

impl FeedField {
    pub fn name(self) -> &'static str {
        match self {
            FeedField::Title => "title",
            FeedField::Lang => "lang",
        }
    }

    /// Reads the field from the page: the `<title>` text or `<html lang>`.
    pub fn from_page(self, doc: &Html) -> Option<String> {
        let value = match self {
            FeedField::Title => doc
                .select(&TITLE_SELECTOR)
                .next()
                .map(|el| el.text().collect::<String>()),
            FeedField::Lang => doc
                .select(&HTML_SELECTOR)
                .next()
                .and_then(|el| el.value().attr("lang"))
                .map(str::to_owned),
        }?;
        let value = clean_text(&value);
        (!value.is_empty()).then_some(value)
    }

    /// Resolves the field: configured value, then the prior feed's value,
    /// then the page value (see [`FeedField::from_page`]), then the empty
    /// string.
    ///
    /// feed-rs lowercases RSS `<language>`, so a prior `lang` that matches
    /// the page's apart from case keeps the page's spelling.
    pub fn resolve(
        self,
        configured: Option<&str>,
        prior: Option<&str>,
        page: Option<&str>,
    ) -> String {
        if let Some(value) = configured {
            return value.to_owned();
        }
        if let Some(value) = prior {
            return match page {
                Some(page) if self == FeedField::Lang && page.eq_ignore_ascii_case(value) => {
                    page.to_owned()
                }
                _ => value.to_owned(),
            };
        }
        page.map(str::to_owned).unwrap_or_else(|| {
            tracing::debug!(field = self.name(), "Feed field not found on page");
            String::new()
        })
    }
}
