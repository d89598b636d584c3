//! The scrape pipeline: fetch once, extract, look up linked content,
//! assemble, merge.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::collections::BTreeSet;
use thiserror::Error;
use url::Url;

use crate::config::FeedConfig;
use crate::extract::{
    content_calls, extract_entries, ExtractionRules, FeedField, FetchedContent, RawFields,
};
use crate::feed::{
    assemble, build_entries, merge, Feed, FeedFormat, FeedHeader, InvalidFeedFormat, PriorFeed,
};
use crate::fetch::{fetch_document, get_content, FetchError};

/// Maximum `get_content` pages fetched at once.
const MAX_CONCURRENT_FETCHES: usize = 10;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Format(#[from] InvalidFeedFormat),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Everything the pipeline needs from the parsed page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedPage {
    /// Raw fields of each context match, in document order.
    pub entries: Vec<RawFields>,
    pub title: Option<String>,
    pub lang: Option<String>,
}

impl ScrapedPage {
    pub fn extract(doc: &Html, rules: &ExtractionRules) -> Self {
        Self {
            entries: extract_entries(doc, rules),
            title: FeedField::Title.from_page(doc),
            lang: FeedField::Lang.from_page(doc),
        }
    }
}

/// Fetches the configured page and builds its feed.
///
/// The format is checked before anything is fetched, so a bad `format`
/// fails fast. `now` is the run's timestamp: every new entry is published at
/// it and it becomes the feed's `updated` when the feed changed.
pub async fn scrape(
    client: &reqwest::Client,
    config: &FeedConfig,
    prior: Option<&PriorFeed>,
    now: DateTime<Utc>,
) -> Result<Feed, ScrapeError> {
    let format = FeedFormat::from_config(config.format.as_deref())?;

    let document = fetch_document(client, &config.path, config.timeout).await?;
    // The parsed tree is not Send, so it is dropped before the next await
    let page = ScrapedPage::extract(&Html::parse_document(&document), &config.entry);

    let fetched = fetch_content(client, config, &page.entries).await;

    Ok(build_feed(config, format, &page, &fetched, prior, now))
}

/// Fetches the pages behind every `get_content` call in the field templates,
/// once per distinct path and selector.
///
/// Relative paths are resolved against the scraped page's URL. A lookup that
/// fails is logged and renders as the empty string.
pub async fn fetch_content(
    client: &reqwest::Client,
    config: &FeedConfig,
    entries: &[RawFields],
) -> FetchedContent {
    let keys: BTreeSet<(String, String)> = config
        .entry
        .templates()
        .values()
        .flat_map(|template| content_calls(template))
        .flat_map(|call| entries.iter().filter_map(move |entry| call.key(entry)))
        .collect();

    if keys.is_empty() {
        return FetchedContent::new();
    }
    tracing::debug!(pages = keys.len(), "Fetching linked content");

    stream::iter(keys)
        .map(|(path, selector)| async move {
            let target = resolve_target(&config.path, &path);
            let value = match get_content(client, &target, &selector, config.timeout).await {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(
                        path = %target,
                        selector = %selector,
                        error = %e,
                        "Content lookup failed, field left empty"
                    );
                    String::new()
                }
            };
            ((path, selector), value)
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect::<FetchedContent>()
        .await
}

/// Joins a relative `path` onto an http(s) `base`. Anything else is used as
/// given.
fn resolve_target(base: &str, path: &str) -> String {
    if Url::parse(path).is_ok() {
        return path.to_owned();
    }
    match Url::parse(base) {
        Ok(base) if matches!(base.scheme(), "http" | "https") => base
            .join(path)
            .map(String::from)
            .unwrap_or_else(|_| path.to_owned()),
        _ => path.to_owned(),
    }
}

/// Builds the feed for an already extracted page.
pub fn build_feed(
    config: &FeedConfig,
    format: FeedFormat,
    page: &ScrapedPage,
    fetched: &FetchedContent,
    prior: Option<&PriorFeed>,
    now: DateTime<Utc>,
) -> Feed {
    let entries = build_entries(&page.entries, config.entry.templates(), fetched, format, now);
    let merged = merge(entries, prior, format, config.keep_prior_entries, now);

    let header = FeedHeader {
        title: FeedField::Title.resolve(
            config.title.as_deref(),
            prior.and_then(|p| p.title.as_deref()),
            page.title.as_deref(),
        ),
        link: config.path.clone(),
        lang: FeedField::Lang.resolve(
            config.lang.as_deref(),
            prior.and_then(|p| p.lang.as_deref()),
            page.lang.as_deref(),
        ),
    };

    tracing::info!(
        path = %config.path,
        format = %format,
        extracted = page.entries.len(),
        new = merged.new_count,
        total = merged.entries.len(),
        "Feed built"
    );

    assemble(format, header, merged)
}
