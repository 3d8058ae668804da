//! AWS News Digest - an RSS digest of AWS announcements
//!
//! The aggregator fetches a fixed set of AWS feeds and writes a deduplicated,
//! newest-first `news.json`. The viewer serves that document as a card list
//! filterable by category.

pub mod aggregate;
pub mod category;
pub mod config;
pub mod fetcher;
pub mod news;
pub mod routes;
pub mod viewer;
