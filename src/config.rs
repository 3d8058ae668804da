use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::aggregate::MAX_ITEMS;
use crate::category::Category;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Where the aggregator writes the news document
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Maximum number of items kept per run
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Per-feed fetch timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u64,
    /// Address the viewer listens on
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
}

fn default_output() -> PathBuf {
    PathBuf::from("news.json")
}

fn default_max_items() -> usize {
    MAX_ITEMS
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_feeds() -> Vec<FeedConfig> {
    Category::ALL
        .into_iter()
        .map(|category| FeedConfig {
            name: category.source_name().to_string(),
            url: category.default_feed_url().to_string(),
        })
        .collect()
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: default_output(),
            max_items: default_max_items(),
            fetch_timeout: default_fetch_timeout(),
            listen: default_listen(),
            feeds: default_feeds(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads `path`, falling back to the built-in defaults when it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Feed names the viewer has no tab for.
    pub fn unmapped_feeds(&self) -> Vec<&str> {
        self.feeds
            .iter()
            .filter(|feed| Category::from_source(&feed.name).is_none())
            .map(|feed| feed.name.as_str())
            .collect()
    }
}
