//! XML rendering for RSS 2.0 and Atom 1.0.

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use std::path::Path;

use super::{Entry, Feed, FeedFormat};
use crate::util::strip_control_chars;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Renders `feed` as a complete XML document in its own format.
pub fn render(feed: &Feed) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    match feed.format {
        FeedFormat::Rss => write_rss(&mut writer, feed)?,
        FeedFormat::Atom => write_atom(&mut writer, feed)?,
    }

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).context("Generated feed contains invalid UTF-8")
}

/// Renders `feed` and writes it to `path` atomically.
///
/// The document goes to a temporary file next to `path`, is synced to disk
/// and then renamed over the destination, so readers never see a partial
/// feed.
pub fn render_to_file(feed: &Feed, path: &Path) -> Result<()> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let content = render(feed)?;

    // Randomized temp filename to prevent TOCTOU race conditions
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions",
                temp_path.display()
            )
        })?;

    file.write_all(content.as_bytes()).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to write feed to temporary file '{}'", temp_path.display())
    })?;

    file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to sync temporary file '{}' to disk",
            temp_path.display()
        )
    })?;

    drop(file);

    std::fs::rename(&temp_path, path).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}'",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

// ============================================================================
// RSS 2.0
// ============================================================================

fn write_rss(writer: &mut XmlWriter, feed: &Feed) -> Result<()> {
    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;
    start(writer, "channel")?;

    text_element(writer, "title", &feed.title)?;
    text_element(writer, "link", &feed.link)?;
    text_element(writer, "description", &feed.title)?;
    if !feed.lang.is_empty() {
        text_element(writer, "language", &feed.lang)?;
    }
    text_element(writer, "lastBuildDate", &feed.updated)?;
    text_element(writer, "generator", &feed.generator)?;

    for entry in &feed.entries {
        write_rss_item(writer, entry)?;
    }

    end(writer, "channel")?;
    end(writer, "rss")
}

fn write_rss_item(writer: &mut XmlWriter, entry: &Entry) -> Result<()> {
    start(writer, "item")?;
    text_element(writer, "title", &entry.title)?;
    text_element(writer, "link", &entry.link)?;
    text_element(writer, "description", &entry.content)?;

    if !entry.id.is_empty() {
        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        element(writer, guid, &entry.id)?;
    }

    if !entry.published.is_empty() {
        text_element(writer, "pubDate", &entry.published)?;
    }
    end(writer, "item")
}

// ============================================================================
// Atom 1.0
// ============================================================================

fn write_atom(writer: &mut XmlWriter, feed: &Feed) -> Result<()> {
    let mut root = BytesStart::new("feed");
    root.push_attribute(("xmlns", ATOM_NS));
    if !feed.lang.is_empty() {
        root.push_attribute(("xml:lang", feed.lang.as_str()));
    }
    writer
        .write_event(Event::Start(root))
        .context("Failed to write feed element")?;

    text_element(writer, "id", &feed.id)?;
    text_element(writer, "title", &feed.title)?;
    link_element(writer, &feed.link)?;
    text_element(writer, "updated", &feed.updated)?;
    text_element(writer, "generator", &feed.generator)?;

    for entry in &feed.entries {
        start(writer, "entry")?;
        text_element(writer, "id", &entry.id)?;
        text_element(writer, "title", &entry.title)?;
        link_element(writer, &entry.link)?;
        text_element(writer, "updated", &entry.updated)?;
        text_element(writer, "published", &entry.published)?;

        let mut content = BytesStart::new("content");
        content.push_attribute(("type", "html"));
        element(writer, content, &entry.content)?;

        end(writer, "entry")?;
    }

    end(writer, "feed")
}

fn link_element(writer: &mut XmlWriter, href: &str) -> Result<()> {
    let href = strip_control_chars(href);
    let mut link = BytesStart::new("link");
    link.push_attribute(("href", &*href));
    writer
        .write_event(Event::Empty(link))
        .context("Failed to write link element")
}

// ============================================================================
// Helpers
// ============================================================================

fn start(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {} element", name))
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {} end", name))
}

/// Writes `start`, the escaped `value` and the matching end tag, or a
/// self-closing element when `value` is empty.
fn element(writer: &mut XmlWriter, start: BytesStart<'_>, value: &str) -> Result<()> {
    let value = strip_control_chars(value);
    if value.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .context("Failed to write empty element");
    }

    let end = start.to_end().into_owned();
    writer
        .write_event(Event::Start(start))
        .context("Failed to write element start")?;
    writer
        .write_event(Event::Text(BytesText::new(&value)))
        .context("Failed to write element text")?;
    writer
        .write_event(Event::End(end))
        .context("Failed to write element end")
}

fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> Result<()> {
    element(writer, BytesStart::new(name), value)
}
