use super::FeedFormat;

/// One feed entry, built from a matched context node or carried over from a
/// prior feed.
///
/// `published` and `updated` are already formatted with the feed format's
/// date pattern. `id` is empty when no tag could be derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub content: String,
    pub published: String,
    pub updated: String,
}

/// A complete feed, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub format: FeedFormat,
    pub id: String,
    pub title: String,
    /// The scraped page's path or URL.
    pub link: String,
    pub lang: String,
    /// Feed-level timestamp, formatted like entry dates.
    pub updated: String,
    pub generator: String,
    /// New entries in document order, followed by any kept prior entries.
    pub entries: Vec<Entry>,
}
