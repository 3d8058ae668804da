use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// A single normalized feed entry, as stored in `news.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "pub_date_format"
    )]
    pub pub_date: Option<DateTime<Utc>>,
}

impl NewsItem {
    /// Items without a usable date sort as if published at the epoch.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.pub_date.unwrap_or(DateTime::UNIX_EPOCH)
    }

    pub fn category(&self) -> Option<Category> {
        Category::from_source(&self.source)
    }
}

/// The file written by one aggregation run and read by the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDocument {
    #[serde(with = "timestamp_format")]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<NewsItem>,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed news document: {0}")]
    Json(#[from] serde_json::Error),
}

impl NewsDocument {
    pub fn new(items: Vec<NewsItem>, now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            items,
        }
    }

    pub async fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replaces the document at `path`.
    ///
    /// The JSON is written to `<path>.tmp` first and renamed into place, so
    /// readers only ever see a complete document.
    pub async fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let json = self.to_json()?;

        let mut tmp = OsString::from(path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let io_err = |source: std::io::Error| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        };
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }

    /// Number of items per raw source, in the order sources first appear.
    pub fn source_breakdown(&self) -> Vec<(String, usize)> {
        let mut breakdown: Vec<(String, usize)> = Vec::new();
        for item in &self.items {
            match breakdown.iter_mut().find(|(source, _)| *source == item.source) {
                Some((_, count)) => *count += 1,
                None => breakdown.push((item.source.clone(), 1)),
            }
        }
        breakdown
    }
}

/// Accepts RFC 3339 (what we write) and RFC 2822 (what RSS feeds carry).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

mod pub_date_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => serializer.serialize_none(),
        }
    }

    // Unparseable dates are dropped rather than rejecting the whole document.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_date))
    }
}

mod timestamp_format {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid lastUpdated timestamp '{}'", raw)))
    }
}
