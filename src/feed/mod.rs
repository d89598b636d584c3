//! Feed construction, deduplication and rendering.
//!
//! - [`format`] - RSS / Atom selection and per-format date patterns
//! - [`identity`] - Tag URIs derived from an entry's link and publish date
//! - [`prior`] - Reading a previously generated feed with `feed-rs`
//! - [`merge`] - Deduplication against the prior feed, feed timestamp policy
//! - [`assemble`] - Entry and feed composition
//! - [`render`] - XML output with `quick-xml`
//!
//! # Example
//!
//! ```ignore
//! use pagefeed::feed::{build_entries, merge, assemble, render, FeedFormat};
//!
//! let entries = build_entries(&raw, rules.templates(), &fetched, FeedFormat::Rss, now);
//! let merged = merge(entries, prior.as_ref(), FeedFormat::Rss, false, now);
//! let xml = render(&assemble(FeedFormat::Rss, header, merged))?;
//! ```

mod assemble;
mod format;
mod identity;
mod merge;
mod prior;
mod render;
mod types;

pub use assemble::{assemble, build_entries, build_entry, FeedHeader, GENERATOR};
pub use format::{FeedFormat, FormatSpec, InvalidFeedFormat};
pub use identity::generate_tag;
pub use merge::{decide_updated, filter_new, known_ids, merge, MergeOutcome};
pub use prior::{PriorEntry, PriorFeed, PriorFeedError};
pub use render::{render, render_to_file};
pub use types::{Entry, Feed};
