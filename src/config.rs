//! Feed configuration file parser.
//!
//! A config file describes one page to scrape: where to fetch it from, which
//! CSS selectors locate entries and their fields, and optional templates that
//! override extracted values.
//!
//! ```toml
//! path = "https://example.com/news"
//! format = "atom"
//!
//! [entry.selectors]
//! context = "div.entry"
//! title = "h2.title a::text"
//! link = "h2.title a@href"
//!
//! [entry.templates]
//! link = "https://example.com{{ entry.link }}"
//! ```
//!
//! `entry.xpath` is accepted as an alias of `entry.selectors`.
//! Unknown keys are ignored, though we log a warning for likely typos.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::extract::ExtractionRules;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Missing required key: {0}")]
    MissingKey(&'static str),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// On-disk shape of the config file. Every key is optional here so that
/// required keys can be reported by name instead of as a serde error.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    path: Option<String>,
    format: Option<String>,
    title: Option<String>,
    lang: Option<String>,
    entry: Option<RawEntry>,
    #[serde(default)]
    keep_prior_entries: bool,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "xpath")]
    selectors: Option<BTreeMap<String, String>>,
    #[serde(default)]
    templates: BTreeMap<String, String>,
}

/// Validated configuration for a single scrape run.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Fetch target: an `http(s)` URL or a local file path. Also the feed link.
    pub path: String,
    /// Output format name, checked when the run starts (`rss` when absent).
    pub format: Option<String>,
    /// Explicit feed title; beats the prior feed and the page `<title>`.
    pub title: Option<String>,
    /// Explicit feed language; beats the prior feed and `<html lang>`.
    pub lang: Option<String>,
    /// Entry selection rules and field templates.
    pub entry: ExtractionRules,
    /// Append prior entries that were not re-extracted after the new ones.
    pub keep_prior_entries: bool,
    /// User-Agent header for HTTP fetches.
    pub user_agent: String,
    /// Per-request timeout for HTTP fetches.
    pub timeout: Duration,
}

impl FeedConfig {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    const KNOWN_KEYS: [&'static str; 8] = [
        "path",
        "format",
        "title",
        "lang",
        "entry",
        "keep_prior_entries",
        "user_agent",
        "timeout_secs",
    ];

    /// Load and validate a feed configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::NotFound)`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Missing `path` or `entry.selectors.context` → `Err(ConfigError::MissingKey)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            target = %config.path,
            fields = config.entry.fields().len(),
            "Loaded feed configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration from TOML source text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if let Ok(table) = content.parse::<toml::Table>() {
            for key in table.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let raw: RawConfig = toml::from_str(content)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let path = raw
            .path
            .filter(|p| !p.trim().is_empty())
            .ok_or(ConfigError::MissingKey("path"))?;
        let entry = raw.entry.ok_or(ConfigError::MissingKey("entry"))?;
        let mut selectors = entry.selectors.ok_or(ConfigError::MissingKey("selectors"))?;
        let context = selectors
            .remove(ExtractionRules::CONTEXT_KEY)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ConfigError::MissingKey("context"))?;

        Ok(Self {
            path,
            format: raw.format,
            title: raw.title,
            lang: raw.lang,
            entry: ExtractionRules::new(context, selectors, entry.templates),
            keep_prior_entries: raw.keep_prior_entries,
            user_agent: raw.user_agent.unwrap_or_else(|| {
                format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            }),
            timeout: Duration::from_secs(raw.timeout_secs.unwrap_or(Self::DEFAULT_TIMEOUT_SECS)),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
title = "Sample Feed Config"
path = "tests/fixtures/sample.html"

[entry.templates]
link = "http://example.com{{ entry.link }}"

[entry.selectors]
context = "div.entry"
title = "h2.title a::text"
link = "h2.title a@href"
content = "div.content::text"
"#;

    #[test]
    fn test_valid_config() {
        let config = FeedConfig::from_toml_str(VALID).unwrap();
        assert_eq!(config.path, "tests/fixtures/sample.html");
        assert_eq!(config.title.as_deref(), Some("Sample Feed Config"));
        assert_eq!(config.format, None);
        assert_eq!(config.lang, None);
        assert_eq!(config.entry.context(), "div.entry");
        assert_eq!(config.entry.fields().len(), 3);
        assert!(!config.entry.fields().contains_key("context"));
        assert_eq!(
            config.entry.templates().get("link").map(String::as_str),
            Some("http://example.com{{ entry.link }}")
        );
        assert!(!config.keep_prior_entries);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("pagefeed/"));
    }

    #[test]
    fn test_xpath_alias_accepted() {
        let content = r#"
path = "page.html"
[entry.xpath]
context = "li"
"#;
        let config = FeedConfig::from_toml_str(content).unwrap();
        assert_eq!(config.entry.context(), "li");
        assert!(config.entry.fields().is_empty());
    }

    #[test]
    fn test_missing_path() {
        let content = "[entry.selectors]\ncontext = \"li\"\n";
        let err = FeedConfig::from_toml_str(content).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("path")));
        assert_eq!(err.to_string(), "Missing required key: path");
    }

    #[test]
    fn test_missing_entry() {
        let err = FeedConfig::from_toml_str("path = \"x.html\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("entry")));
    }

    #[test]
    fn test_missing_selectors() {
        let content = "path = \"x.html\"\n[entry.templates]\ntitle = \"t\"\n";
        let err = FeedConfig::from_toml_str(content).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("selectors")));
    }

    #[test]
    fn test_missing_context() {
        let content = "path = \"x.html\"\n[entry.selectors]\ntitle = \"h2::text\"\n";
        let err = FeedConfig::from_toml_str(content).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("context")));
    }

    #[test]
    fn test_empty_context_is_missing() {
        let content = "path = \"x.html\"\n[entry.selectors]\ncontext = \"  \"\n";
        let err = FeedConfig::from_toml_str(content).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("context")));
    }

    #[test]
    fn test_empty_file_reports_missing_path() {
        let err = FeedConfig::from_toml_str("").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey("path")));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = FeedConfig::from_toml_str("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let content = "path = 42\n[entry.selectors]\ncontext = \"li\"\n";
        assert!(matches!(
            FeedConfig::from_toml_str(content),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_optional_tuning_keys() {
        let content = r#"
path = "https://example.com/"
format = "atom"
lang = "en"
keep_prior_entries = true
user_agent = "test-agent"
timeout_secs = 5
unknown_key = "ignored"

[entry.selectors]
context = "article"
"#;
        let config = FeedConfig::from_toml_str(content).unwrap();
        assert_eq!(config.format.as_deref(), Some("atom"));
        assert_eq!(config.lang.as_deref(), Some("en"));
        assert!(config.keep_prior_entries);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/tmp/pagefeed_test_nonexistent_config.toml");
        let err = FeedConfig::load(path).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = std::env::temp_dir().join("pagefeed_config_test_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feed.toml");
        std::fs::write(&path, VALID).unwrap();

        let config = FeedConfig::load(&path).unwrap();
        assert_eq!(config.entry.context(), "div.entry");

        std::fs::remove_dir_all(&dir).ok();
    }

    // File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("pagefeed_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("feed.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = FeedConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
