use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use pagefeed::config::FeedConfig;
use pagefeed::feed::{self, FeedFormat, PriorFeed};
use pagefeed::scrape::scrape;

/// Maximum prior feed size read from a file or stdin.
const MAX_PRIOR_SIZE: u64 = 10 * 1024 * 1024; // 10MB

#[derive(Parser, Debug)]
#[command(
    name = "pagefeed",
    version,
    about = "Scrape an HTML page into an RSS or Atom feed"
)]
struct Args {
    /// Feed configuration file (TOML)
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Previously generated feed; entries already in it are skipped.
    /// Defaults to stdin when stdin is not a terminal.
    #[arg(long, value_name = "FILE")]
    prior: Option<PathBuf>,

    /// Write the feed to FILE instead of stdout
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format, overriding the config file
    #[arg(long, value_parser = ["rss", "atom"])]
    format: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the feed
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = FeedConfig::load(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config.display()))?;
    if let Some(format) = args.format {
        config.format = Some(format);
    }
    // Reject a bad format before reading prior input or fetching
    FeedFormat::from_config(config.format.as_deref())?;

    let prior = read_prior(args.prior.as_deref())?;

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;

    let feed = scrape(&client, &config, prior.as_ref(), Utc::now())
        .await
        .with_context(|| format!("Failed to scrape '{}'", config.path))?;

    match args.output {
        Some(path) => feed::render_to_file(&feed, &path)
            .with_context(|| format!("Failed to write feed to '{}'", path.display()))?,
        None => {
            let xml = feed::render(&feed)?;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(xml.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .context("Failed to write feed to stdout")?;
        }
    }

    Ok(())
}

/// Reads the prior feed from `path`, or from stdin when no path is given and
/// stdin is piped. Empty input means there is no prior feed.
fn read_prior(path: Option<&Path>) -> Result<Option<PriorFeed>> {
    let bytes = match path {
        Some(path) => {
            let mut bytes = Vec::new();
            std::fs::File::open(path)
                .and_then(|f| f.take(MAX_PRIOR_SIZE + 1).read_to_end(&mut bytes))
                .with_context(|| format!("Failed to read prior feed '{}'", path.display()))?;
            bytes
        }
        None if !std::io::stdin().is_terminal() => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .lock()
                .take(MAX_PRIOR_SIZE + 1)
                .read_to_end(&mut bytes)
                .context("Failed to read prior feed from stdin")?;
            bytes
        }
        None => return Ok(None),
    };

    if bytes.len() as u64 > MAX_PRIOR_SIZE {
        anyhow::bail!("Prior feed too large (max {} bytes)", MAX_PRIOR_SIZE);
    }

    let prior = PriorFeed::read(&bytes)?;
    if let Some(prior) = &prior {
        tracing::debug!(entries = prior.entries.len(), "Read prior feed");
    }
    Ok(prior)
}
