//! Page retrieval.
//!
//! - [`document`] - HTTP(S) fetching with retry, timeout and size limits, or
//!   local file reads for any other path
//! - [`content`] - Fetch a page and pull out one cleaned fragment

mod content;
mod document;

pub use content::{get_content, ContentError};
pub use document::{fetch_document, FetchError};
