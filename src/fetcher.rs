use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use feed_rs::parser;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use tracing::{error, info, warn};

use crate::aggregate::{aggregate, SourceResult};
use crate::config::{Config, FeedConfig};
use crate::news::{NewsDocument, NewsItem};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned status {0}")]
    Status(StatusCode),
    #[error("failed to parse feed: {0}")]
    Parse(#[from] parser::ParseFeedError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.fetch_timeout);
        // The whole fetch-and-parse is bounded in `fetch_feed`
        let client = Client::builder()
            .user_agent("AwsNewsDigest/1.0 (RSS Aggregator)")
            .build()
            .expect("Failed to create HTTP client");

        Self { client, timeout }
    }

    /// Fetches and normalizes one feed, bounded by the configured timeout.
    pub async fn fetch_feed(&self, feed: &FeedConfig) -> Result<Vec<NewsItem>, FetchError> {
        info!("Fetching {} ({})", feed.name, feed.url);

        match tokio::time::timeout(self.timeout, self.fetch_and_parse(feed)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }

    async fn fetch_and_parse(&self, feed: &FeedConfig) -> Result<Vec<NewsItem>, FetchError> {
        let response = self.client.get(&feed.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await?;
        let parsed = parser::parse(&bytes[..])?;

        Ok(normalize_entries(&feed.name, parsed))
    }

    /// Fetches every feed concurrently.
    ///
    /// Each feed yields its own outcome: a failure is logged and turns into an
    /// empty contribution, and never cancels the other fetches. Results come
    /// back in the order of `feeds`.
    pub async fn fetch_all(&self, feeds: &[FeedConfig]) -> Vec<SourceResult> {
        let tasks = feeds.iter().map(|feed| async move {
            let items = match self.fetch_feed(feed).await {
                Ok(items) => {
                    info!("Fetched {} items from '{}'", items.len(), feed.name);
                    items
                }
                Err(e) => {
                    error!("Error fetching '{}': {}", feed.name, e);
                    Vec::new()
                }
            };

            SourceResult {
                source: feed.name.clone(),
                items,
            }
        });

        join_all(tasks).await
    }
}

/// Converts parsed feed entries into news items attributed to `source`.
pub fn normalize_entries(source: &str, feed: feed_rs::model::Feed) -> Vec<NewsItem> {
    let mut items = Vec::with_capacity(feed.entries.len());

    for entry in feed.entries {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_else(|| "Untitled".to_string());

        let link = entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default();

        if link.is_empty() {
            warn!("Skipping entry with no link from '{}': {}", source, title);
            continue;
        }

        items.push(NewsItem {
            title,
            link,
            source: source.to_string(),
            pub_date: entry.published.or(entry.updated),
        });
    }

    items
}

/// One aggregation run: fetch every feed, build the document and replace the
/// file at `config.output`.
///
/// Feed failures are absorbed; only a failure to write the document is
/// returned as an error.
pub async fn run_aggregation(config: &Config) -> anyhow::Result<NewsDocument> {
    info!("Starting to fetch {} RSS feeds", config.feeds.len());

    let fetcher = Fetcher::new(config);
    let results = fetcher.fetch_all(&config.feeds).await;

    let (document, stats) = aggregate(results, config.max_items, Utc::now());
    info!("Total items fetched: {}", stats.fetched);
    info!("Unique items: {}", stats.unique);
    info!("Keeping top: {}", stats.kept);

    document
        .write_to(&config.output)
        .await
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    info!(
        "Generated {} with {} items (last updated {})",
        config.output.display(),
        document.items.len(),
        document.last_updated.to_rfc3339()
    );
    for (source, count) in document.source_breakdown() {
        info!("  {}: {}", source, count);
    }

    Ok(document)
}
