//! Viewer state and presentation logic.
//!
//! Everything here is independent of the web layer: each request loads its
//! own [`Viewer`], calls [`Viewer::select`] for a tab click and renders the
//! [`ViewModel`] returned by [`Viewer::render`].

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Datelike, Utc};
use tracing::{error, info};

use crate::category::{badge_label, Category, Filter};
use crate::news::{NewsDocument, NewsItem};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load news. Please try again later.";
pub const NO_ITEMS_MESSAGE: &str = "No news items in this category yet.";

/// Item counts per category, plus the total of all loaded items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub total: usize,
    by_category: HashMap<Category, usize>,
}

impl CategoryCounts {
    pub fn from_items(items: &[NewsItem]) -> Self {
        let mut by_category = HashMap::new();
        for category in items.iter().filter_map(NewsItem::category) {
            *by_category.entry(category).or_insert(0) += 1;
        }
        Self {
            total: items.len(),
            by_category,
        }
    }

    pub fn get(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    pub fn for_filter(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.total,
            Filter::Only(category) => self.get(category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub key: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub link: String,
    pub badge: String,
    pub css_class: &'static str,
    pub relative_date: String,
    pub animation_delay: String,
}

/// Everything the page needs for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub last_updated: Option<String>,
    pub tabs: Vec<Tab>,
    pub cards: Vec<Card>,
    /// Set when the placeholder replaces the card grid.
    pub empty_message: Option<&'static str>,
}

impl ViewModel {
    pub fn is_empty(&self) -> bool {
        self.empty_message.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Viewer {
    all_news: Vec<NewsItem>,
    last_updated: Option<DateTime<Utc>>,
    current_filter: Filter,
    load_error: Option<String>,
}

impl Viewer {
    pub fn from_document(document: NewsDocument) -> Self {
        Self {
            all_news: document.items,
            last_updated: Some(document.last_updated),
            current_filter: Filter::All,
            load_error: None,
        }
    }

    /// Reads the news document. A missing or malformed file leaves the viewer
    /// in its failed state; there is no retry.
    pub async fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match NewsDocument::read_from(path).await {
            Ok(document) => {
                info!(
                    "Loaded {} news items from {}",
                    document.items.len(),
                    path.display()
                );
                Self::from_document(document)
            }
            Err(e) => {
                error!("Error loading news: {}", e);
                Self {
                    load_error: Some(e.to_string()),
                    ..Self::default()
                }
            }
        }
    }

    pub fn all_news(&self) -> &[NewsItem] {
        &self.all_news
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn current_filter(&self) -> Filter {
        self.current_filter
    }

    pub fn load_failed(&self) -> bool {
        self.load_error.is_some()
    }

    pub fn select(&mut self, filter: Filter) {
        self.current_filter = filter;
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts::from_items(&self.all_news)
    }

    pub fn visible_items(&self) -> Vec<&NewsItem> {
        self.all_news
            .iter()
            .filter(|item| self.current_filter.matches(item))
            .collect()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        let counts = self.counts();
        std::iter::once((Filter::All, "All"))
            .chain(
                Category::ALL
                    .into_iter()
                    .map(|category| (Filter::Only(category), category.label())),
            )
            .map(|(filter, label)| Tab {
                key: filter.key(),
                label,
                count: counts.for_filter(filter),
                active: filter == self.current_filter,
            })
            .collect()
    }

    pub fn render(&self, now: DateTime<Utc>) -> ViewModel {
        let tabs = self.tabs();

        if self.load_failed() {
            return ViewModel {
                last_updated: None,
                tabs,
                cards: Vec::new(),
                empty_message: Some(LOAD_FAILED_MESSAGE),
            };
        }

        let cards: Vec<Card> = self
            .visible_items()
            .into_iter()
            .enumerate()
            .map(|(index, item)| card_for(index, item, now))
            .collect();

        let empty_message = cards.is_empty().then_some(NO_ITEMS_MESSAGE);

        ViewModel {
            last_updated: self.last_updated.map(format_last_updated),
            tabs,
            cards,
            empty_message,
        }
    }
}

fn card_for(index: usize, item: &NewsItem, now: DateTime<Utc>) -> Card {
    Card {
        title: item.title.clone(),
        link: item.link.clone(),
        badge: badge_label(&item.source),
        // Unknown sources borrow the news blog styling
        css_class: item
            .category()
            .unwrap_or(Category::NewsBlog)
            .key(),
        relative_date: item
            .pub_date
            .map(|date| relative_time(date, now))
            .unwrap_or_default(),
        animation_delay: format!("{:.2}s", index as f64 * 0.05),
    }
}

/// Human-relative age of `date` as seen at `now`, coarsening from seconds to
/// weeks before falling back to a short calendar date.
pub fn relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - date).num_seconds();
    if seconds < 60 {
        return "Just now".to_string();
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }

    let weeks = days / 7;
    if weeks < 4 {
        return format!("{}w ago", weeks);
    }

    if date.year() == now.year() {
        date.format("%b %-d").to_string()
    } else {
        date.format("%b %-d, %Y").to_string()
    }
}

pub fn format_last_updated(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y, %I:%M %p UTC").to_string()
}
