//! End-to-end tests for the scrape pipeline: config → fetch → extract →
//! merge → render, and feeding a run's output back in as the prior feed.
//!
//! Pages come from `tests/fixtures/`, either read from disk or served by a
//! wiremock server.

use chrono::{DateTime, TimeZone, Utc};
use pagefeed::config::{ConfigError, FeedConfig};
use pagefeed::feed::{render, Feed, PriorFeed};
use pagefeed::scrape::{scrape, ScrapeError};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_config() -> FeedConfig {
    let mut config = FeedConfig::load(&fixture("valid-config.toml")).unwrap();
    config.path = fixture("sample.html").to_string_lossy().into_owned();
    config
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 7, 1, 3, 12, 39).unwrap()
}

async fn run(config: &FeedConfig, prior: Option<&PriorFeed>, now: DateTime<Utc>) -> Feed {
    let client = reqwest::Client::new();
    scrape(&client, config, prior, now).await.unwrap()
}

// ============================================================================
// Extraction
// ============================================================================

#[tokio::test]
async fn test_one_entry_per_context_node() {
    let feed = run(&load_config(), None, now()).await;

    assert_eq!(feed.entries.len(), 3);
    assert_eq!(feed.entries[0].title, "Entry1 Title");
    assert_eq!(feed.entries[1].link, "http://example.com/entry2.html");
    assert_eq!(feed.entries[2].content, "Entry3 Content");
}

#[tokio::test]
async fn test_feed_metadata_from_page() {
    let config = load_config();
    let feed = run(&config, None, now()).await;

    assert_eq!(feed.title, "Sample HTML Page");
    assert_eq!(feed.lang, "en-US");
    assert_eq!(feed.link, config.path);
    assert_eq!(feed.id, config.path);
    assert_eq!(feed.updated, "Tue, 01 Jul 2014 03:12:39 Z");
    assert!(feed.generator.starts_with("pagefeed "));
}

#[tokio::test]
async fn test_entry_ids_and_dates() {
    let feed = run(&load_config(), None, now()).await;

    let ids: Vec<&str> = feed.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "tag:example.com,2014-07-01:/entry1.html",
            "tag:example.com,2014-07-01:/entry2.html",
            "tag:example.com,2014-07-01:/entry3.html",
        ]
    );
    assert!(feed
        .entries
        .iter()
        .all(|e| e.published == "Tue, 01 Jul 2014 03:12:39 Z"));
}

#[tokio::test]
async fn test_runs_are_deterministic() {
    let config = load_config();
    let first = run(&config, None, now()).await;
    let second = run(&config, None, now()).await;

    assert_eq!(first, second);
    assert_eq!(render(&first).unwrap(), render(&second).unwrap());
}

// ============================================================================
// Prior feed merging
// ============================================================================

#[tokio::test]
async fn test_rerun_with_own_output_has_no_new_entries() {
    for format in ["rss", "atom"] {
        let mut config = load_config();
        config.format = Some(format.to_string());

        let first = run(&config, None, now()).await;
        let xml = render(&first).unwrap();
        let prior = PriorFeed::read(xml.as_bytes()).unwrap().unwrap();

        let later = Utc.with_ymd_and_hms(2014, 7, 1, 18, 0, 0).unwrap();
        let second = run(&config, Some(&prior), later).await;
        assert!(second.entries.is_empty(), "format {}", format);
        assert_eq!(second.title, "Sample HTML Page");
        assert_eq!(second.lang, "en-US", "format {}", format);
    }
}

#[tokio::test]
async fn test_keep_prior_entries_grows_feed() {
    let mut config = load_config();
    config.format = Some("atom".into());
    config.keep_prior_entries = true;

    let first = run(&config, None, now()).await;
    let prior = PriorFeed::parse(render(&first).unwrap().as_bytes()).unwrap();

    let later = Utc.with_ymd_and_hms(2014, 7, 1, 18, 0, 0).unwrap();
    let second = run(&config, Some(&prior), later).await;

    assert_eq!(second.entries.len(), 3);
    assert_eq!(second.entries[0].id, "tag:example.com,2014-07-01:/entry1.html");
    assert_eq!(second.entries[0].published, "2014-07-01T03:12:39Z");
    // Nothing new, so the prior timestamp stands
    assert_eq!(second.updated, "2014-07-01T03:12:39Z");
}

// ============================================================================
// Fetching over HTTP
// ============================================================================

#[tokio::test]
async fn test_scrape_served_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(std::fs::read_to_string(fixture("sample.html")).unwrap())
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = load_config();
    config.path = format!("{}/news", mock_server.uri());
    config.format = Some("atom".into());

    let feed = run(&config, None, now()).await;
    assert_eq!(feed.entries.len(), 3);
    assert_eq!(feed.updated, "2014-07-01T03:12:39Z");

    let xml = render(&feed).unwrap();
    assert!(xml.contains("<title>Entry2 Title</title>"));
    assert!(xml.contains("xml:lang=\"en-US\""));
}

const NEWS_PAGE: &str = r#"<html lang="en"><head><title>News</title></head><body>
<div class="entry"><a href="/articles/1.html">First</a></div>
<div class="entry"><a href="/articles/2.html">Second</a></div>
</body></html>"#;

const NEWS_CONFIG: &str = r#"
path = "SERVER/news"
format = "atom"

[entry.selectors]
context = "div.entry"
title = "a::text"
link = "a@href"

[entry.templates]
link = "SERVER{{ entry.link }}"
content = '{{ get_content(entry.link, "article.body") }}'
"#;

#[tokio::test]
async fn test_content_filled_from_linked_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_string(NEWS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/articles/1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><nav>Menu</nav><article class="body"><p>Full text one</p></article></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    // The second article is gone; its content stays empty
    Mock::given(method("GET"))
        .and(path("/articles/2.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = FeedConfig::from_toml_str(&NEWS_CONFIG.replace("SERVER", &mock_server.uri()))
        .unwrap();
    let feed = run(&config, None, now()).await;

    assert_eq!(feed.entries.len(), 2);
    assert_eq!(feed.entries[0].title, "First");
    assert_eq!(
        feed.entries[0].link,
        format!("{}/articles/1.html", mock_server.uri())
    );
    assert_eq!(
        feed.entries[0].content,
        r#"<article class="body"><p>Full text one</p></article>"#
    );
    assert_eq!(feed.entries[1].title, "Second");
    assert_eq!(feed.entries[1].content, "");
}

#[tokio::test]
async fn test_http_error_is_fetch_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut config = load_config();
    config.path = format!("{}/gone", mock_server.uri());

    let client = reqwest::Client::new();
    let err = scrape(&client, &config, None, now()).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Fetch(_)));
}

// ============================================================================
// Configuration errors
// ============================================================================

#[tokio::test]
async fn test_invalid_format_is_rejected() {
    let mut config = load_config();
    config.format = Some("foo".into());

    let client = reqwest::Client::new();
    let err = scrape(&client, &config, None, now()).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Format(_)));
}

#[test]
fn test_missing_config_file() {
    let err = FeedConfig::load(&fixture("does-not-exist.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_missing_context_selector() {
    let err = FeedConfig::from_toml_str(
        r#"
path = "page.html"

[entry.selectors]
title = "h2::text"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey("context")));
}
