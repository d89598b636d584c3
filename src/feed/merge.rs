use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::{Entry, FeedFormat, PriorFeed};

/// Entries that survived deduplication plus the feed-level timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// New entries in document order, then kept prior entries if requested.
    pub entries: Vec<Entry>,
    /// How many of `entries` were newly extracted in this run.
    pub new_count: usize,
    pub updated: DateTime<Utc>,
}

/// The non-empty entry ids of the prior feed.
pub fn known_ids(prior: Option<&PriorFeed>) -> HashSet<&str> {
    prior
        .map(|p| {
            p.entries
                .iter()
                .map(|e| e.id.as_str())
                .filter(|id| !id.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Drops entries whose id is already known, keeping document order.
/// Entries with an empty id are always kept.
pub fn filter_new(entries: Vec<Entry>, known: &HashSet<&str>) -> Vec<Entry> {
    entries
        .into_iter()
        .filter(|e| e.id.is_empty() || !known.contains(e.id.as_str()))
        .collect()
}

/// Picks the feed-level `updated` timestamp.
///
/// More new entries than the prior feed had ids means the feed changed, so
/// the timestamp is `now`. Otherwise the prior timestamp is kept, falling back
/// to `now` when there was none.
pub fn decide_updated(
    new_count: usize,
    known_count: usize,
    prior_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    if new_count > known_count {
        return now;
    }
    prior_updated.unwrap_or(now)
}

/// Deduplicates `entries` against `prior` and decides the feed timestamp.
///
/// With `keep_prior`, the prior feed's entries follow the new ones so the
/// feed keeps growing across runs. Prior entries without a tag id are left
/// out since they cannot be told apart from a re-extracted entry.
pub fn merge(
    entries: Vec<Entry>,
    prior: Option<&PriorFeed>,
    format: FeedFormat,
    keep_prior: bool,
    now: DateTime<Utc>,
) -> MergeOutcome {
    let known = known_ids(prior);
    let extracted = entries.len();
    let mut merged = filter_new(entries, &known);
    let new_count = merged.len();

    let updated = decide_updated(new_count, known.len(), prior.and_then(|p| p.updated), now);

    tracing::debug!(
        extracted = extracted,
        known = known.len(),
        new = new_count,
        "Merged against prior feed"
    );

    if keep_prior {
        if let Some(prior) = prior {
            merged.extend(
                prior
                    .entries
                    .iter()
                    .filter(|e| e.has_tag_id())
                    .map(|e| e.to_entry(format)),
            );
        }
    }

    MergeOutcome {
        entries: merged,
        new_count,
        updated,
    }
}
