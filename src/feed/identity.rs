use chrono::{NaiveDate, NaiveDateTime};
use url::Url;

/// Derives an entry's tag URI (RFC 4151) from its link and publish date.
///
/// The result has the shape `tag:{authority},{yyyy-mm-dd}:{path}`. The date
/// is read back from `published` with `date_pattern`, the same pattern the
/// feed used to format it; patterns without a time component are accepted.
///
/// Returns the empty string when the link does not parse, has no host, or the
/// date does not match the pattern. Such entries are never treated as already
/// seen.
pub fn generate_tag(link: &str, published: &str, date_pattern: &str) -> String {
    let url = match Url::parse(link) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => url,
        Ok(_) => {
            tracing::debug!(link = %link, "Link has no host, entry id left empty");
            return String::new();
        }
        Err(e) => {
            tracing::debug!(link = %link, error = %e, "Link does not parse, entry id left empty");
            return String::new();
        }
    };

    let Some(date) = parse_date(published, date_pattern) else {
        tracing::debug!(
            published = %published,
            pattern = %date_pattern,
            "Publish date does not match pattern, entry id left empty"
        );
        return String::new();
    };

    format!(
        "tag:{},{}:{}",
        url.authority(),
        date.format("%Y-%m-%d"),
        url.path()
    )
}

fn parse_date(value: &str, pattern: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(value, pattern)
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(value, pattern))
        .ok()
}
