use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The configured format string is neither `rss` nor `atom`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid feed format: `{0}` (expected `rss` or `atom`)")]
pub struct InvalidFeedFormat(pub String);

/// Output feed format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedFormat {
    #[default]
    Rss,
    Atom,
}

/// Per-format constants: the date pattern every emitted date uses and the
/// name of the document shape the renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub date_pattern: &'static str,
    pub template_name: &'static str,
}

const RSS_SPEC: FormatSpec = FormatSpec {
    date_pattern: "%a, %d %b %Y %H:%M:%S Z",
    template_name: "rss.xml",
};

const ATOM_SPEC: FormatSpec = FormatSpec {
    date_pattern: "%Y-%m-%dT%H:%M:%SZ",
    template_name: "atom.xml",
};

impl FeedFormat {
    /// Resolves the configured format, defaulting to RSS when none is set.
    pub fn from_config(value: Option<&str>) -> Result<Self, InvalidFeedFormat> {
        value.map_or(Ok(Self::default()), str::parse)
    }

    pub fn spec(self) -> FormatSpec {
        match self {
            FeedFormat::Rss => RSS_SPEC,
            FeedFormat::Atom => ATOM_SPEC,
        }
    }

    /// Formats a UTC timestamp with this format's date pattern.
    pub fn format_date(self, when: DateTime<Utc>) -> String {
        when.format(self.spec().date_pattern).to_string()
    }

    /// Parses a date previously produced by [`FeedFormat::format_date`].
    pub fn parse_date(self, value: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(value, self.spec().date_pattern)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl FromStr for FeedFormat {
    type Err = InvalidFeedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rss" => Ok(FeedFormat::Rss),
            "atom" => Ok(FeedFormat::Atom),
            other => Err(InvalidFeedFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeedFormat::Rss => "rss",
            FeedFormat::Atom => "atom",
        })
    }
}
