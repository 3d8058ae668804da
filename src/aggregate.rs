use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::news::{NewsDocument, NewsItem};

/// Default cap on the number of items in a generated document.
pub const MAX_ITEMS: usize = 30;

/// Items contributed by one configured feed.
///
/// A feed that failed to fetch or parse contributes an empty list.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub source: String,
    pub items: Vec<NewsItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateStats {
    pub fetched: usize,
    pub unique: usize,
    pub kept: usize,
}

/// Keeps the first item seen for each link, preserving input order.
pub fn dedupe_by_link(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.link.clone()))
        .collect()
}

/// Newest first. The sort is stable, so equal dates keep their relative order.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
}

/// Concatenates per-source results in feed order, then dedupes, sorts and
/// truncates them into a document stamped with `now`.
pub fn aggregate(
    results: Vec<SourceResult>,
    max_items: usize,
    now: DateTime<Utc>,
) -> (NewsDocument, AggregateStats) {
    let all_items: Vec<NewsItem> = results.into_iter().flat_map(|r| r.items).collect();
    let fetched = all_items.len();

    let mut unique = dedupe_by_link(all_items);
    let unique_count = unique.len();

    sort_newest_first(&mut unique);
    unique.truncate(max_items);

    let stats = AggregateStats {
        fetched,
        unique: unique_count,
        kept: unique.len(),
    };

    (NewsDocument::new(unique, now), stats)
}
