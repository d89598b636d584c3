use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::identity::generate_tag;
use super::merge::MergeOutcome;
use super::{Entry, Feed, FeedFormat};
use crate::extract::{resolve_field, FetchedContent, RawFields};

/// Generator string stamped into every feed.
pub const GENERATOR: &str = concat!("pagefeed ", env!("CARGO_PKG_VERSION"));

/// Feed-level values resolved before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedHeader {
    pub title: String,
    pub link: String,
    pub lang: String,
}

/// Builds one entry from a context node's raw field values.
///
/// `title`, `link` and `content` go through the template / raw / empty
/// precedence, with `fetched` supplying pages for `get_content` calls. A
/// template that fails to render leaves its field empty.
/// Every entry of a run is published at `now`; the id is derived last, from
/// the final link and publish date.
pub fn build_entry(
    raw: &RawFields,
    templates: &BTreeMap<String, String>,
    fetched: &FetchedContent,
    format: FeedFormat,
    now: DateTime<Utc>,
) -> Entry {
    let field = |name: &str| {
        resolve_field(name, templates, raw, fetched).unwrap_or_else(|e| {
            tracing::warn!(field = %name, error = %e, "Template failed to render, field left empty");
            String::new()
        })
    };

    let published = format.format_date(now);
    let mut entry = Entry {
        id: String::new(),
        title: field("title"),
        link: field("link"),
        content: field("content"),
        updated: published.clone(),
        published,
    };
    entry.id = generate_tag(&entry.link, &entry.published, format.spec().date_pattern);
    entry
}

/// Builds entries for every extracted node, in document order.
pub fn build_entries(
    raw: &[RawFields],
    templates: &BTreeMap<String, String>,
    fetched: &FetchedContent,
    format: FeedFormat,
    now: DateTime<Utc>,
) -> Vec<Entry> {
    raw.iter()
        .map(|fields| build_entry(fields, templates, fetched, format, now))
        .collect()
}

/// Composes the final feed. The feed id is its link.
pub fn assemble(format: FeedFormat, header: FeedHeader, merged: MergeOutcome) -> Feed {
    Feed {
        format,
        id: header.link.clone(),
        title: header.title,
        link: header.link,
        lang: header.lang,
        updated: format.format_date(merged.updated),
        generator: GENERATOR.to_string(),
        entries: merged.entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_404_184_359, 0).unwrap()
    }

    fn none() -> FetchedContent {
        FetchedContent::new()
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_entry_with_template() {
        let raw = map(&[("title", "Entry1 Title"), ("link", "/entry1.html"), ("content", "Body")]);
        let templates = map(&[("link", "http://example.com{{ entry.link }}")]);

        let entry = build_entry(&raw, &templates, &none(), FeedFormat::Atom, now());
        assert_eq!(
            entry,
            Entry {
                id: "tag:example.com,2014-07-01:/entry1.html".into(),
                title: "Entry1 Title".into(),
                link: "http://example.com/entry1.html".into(),
                content: "Body".into(),
                published: "2014-07-01T03:12:39Z".into(),
                updated: "2014-07-01T03:12:39Z".into(),
            }
        );
    }

    #[test]
    fn test_relative_link_gives_empty_id() {
        let raw = map(&[("link", "/entry1.html")]);
        let entry = build_entry(&raw, &BTreeMap::new(), &none(), FeedFormat::Rss, now());
        assert_eq!(entry.id, "");
        assert_eq!(entry.published, "Tue, 01 Jul 2014 03:12:39 Z");
    }

    #[test]
    fn test_failing_template_leaves_field_empty() {
        let raw = map(&[("title", "Entry1 Title")]);
        let templates = map(&[("title", "{{ feed.title }}")]);
        let entry = build_entry(&raw, &templates, &none(), FeedFormat::Rss, now());
        assert_eq!(entry.title, "");
    }

    #[test]
    fn test_extra_fields_only_feed_templates() {
        let raw = map(&[("slug", "post-9"), ("title", "T")]);
        let templates = map(&[("link", "https://blog.example.org/{{ entry.slug }}")]);
        let entry = build_entry(&raw, &templates, &none(), FeedFormat::Atom, now());
        assert_eq!(entry.link, "https://blog.example.org/post-9");
        assert_eq!(entry.id, "tag:blog.example.org,2014-07-01:/post-9");
    }

    #[test]
    fn test_content_from_fetched_page() {
        let raw = map(&[("title", "T"), ("link", "https://example.com/a.html")]);
        let templates = map(&[(
            "content",
            r#"{{ entry.title }}: {{ get_content(entry.link, "div.body") }}"#,
        )]);
        let fetched = FetchedContent::from([(
            ("https://example.com/a.html".to_string(), "div.body".to_string()),
            "<div class=\"body\">Full</div>".to_string(),
        )]);

        let entry = build_entry(&raw, &templates, &fetched, FeedFormat::Atom, now());
        assert_eq!(entry.content, r#"T: <div class="body">Full</div>"#);
        assert_eq!(entry.id, "tag:example.com,2014-07-01:/a.html");
    }

    #[test]
    fn test_assemble_feed() {
        let merged = MergeOutcome {
            entries: vec![Entry::default()],
            new_count: 1,
            updated: now(),
        };
        let header = FeedHeader {
            title: "Sample HTML Page".into(),
            link: "http://example.com/".into(),
            lang: "en-US".into(),
        };

        let feed = assemble(FeedFormat::Rss, header, merged);
        assert_eq!(feed.id, "http://example.com/");
        assert_eq!(feed.link, "http://example.com/");
        assert_eq!(feed.updated, "Tue, 01 Jul 2014 03:12:39 Z");
        assert!(feed.generator.starts_with("pagefeed "));
        assert_eq!(feed.entries.len(), 1);
    }
}
