use chrono::{DateTime, Utc};
use feed_rs::parser;
use thiserror::Error;

use super::{Entry, FeedFormat};

#[derive(Debug, Error)]
pub enum PriorFeedError {
    #[error("Prior feed is not valid RSS or Atom: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

/// An entry read back from a previously generated feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub content: String,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// The parts of a previously generated feed that the next run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorFeed {
    pub title: Option<String>,
    pub lang: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub entries: Vec<PriorEntry>,
}

impl PriorFeed {
    /// Parses an RSS or Atom document.
    ///
    /// Empty feed titles and languages are treated as absent so they do not
    /// shadow the values found on the page.
    pub fn parse(bytes: &[u8]) -> Result<Self, PriorFeedError> {
        let feed = parser::parse(bytes)?;

        let entries = feed
            .entries
            .into_iter()
            .map(|entry| {
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default();
                let content = entry
                    .content
                    .and_then(|c| c.body)
                    .or_else(|| entry.summary.map(|s| s.content))
                    .unwrap_or_default();

                PriorEntry {
                    id: entry.id.trim().to_string(),
                    title: entry.title.map(|t| t.content).unwrap_or_default(),
                    link,
                    content,
                    published: entry.published,
                    updated: entry.updated,
                }
            })
            .collect();

        Ok(Self {
            title: feed.title.map(|t| t.content).filter(|t| !t.trim().is_empty()),
            lang: feed.language.filter(|l| !l.trim().is_empty()),
            updated: feed.updated,
            entries,
        })
    }

    /// Like [`PriorFeed::parse`], but input that is empty or only whitespace
    /// means there is no prior feed.
    pub fn read(bytes: &[u8]) -> Result<Option<Self>, PriorFeedError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Self::parse(bytes).map(Some)
    }
}

impl PriorEntry {
    /// Whether this entry's id is a tag URI, i.e. one this tool generated
    /// rather than a placeholder the feed parser made up for an id-less item.
    pub fn has_tag_id(&self) -> bool {
        self.id.starts_with("tag:")
    }

    /// Converts back into an [`Entry`], formatting dates for `format`.
    pub fn to_entry(&self, format: FeedFormat) -> Entry {
        let published = self
            .published
            .map(|d| format.format_date(d))
            .unwrap_or_default();
        let updated = self
            .updated
            .map(|d| format.format_date(d))
            .unwrap_or_else(|| published.clone());

        Entry {
            id: self.id.clone(),
            title: self.title.clone(),
            link: self.link.clone(),
            content: self.content.clone(),
            published,
            updated,
        }
    }
}
