//! Turn an HTML page into an RSS or Atom feed.
//!
//! A [`config::FeedConfig`] names the page and the CSS selectors that locate
//! its entries. [`scrape::scrape`] fetches the page once, extracts one entry
//! per context match, derives stable tag ids, drops entries already present
//! in a previously generated feed and returns a [`feed::Feed`] ready for
//! [`feed::render`].

pub mod config;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod scrape;
pub mod util;
