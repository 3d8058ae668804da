use std::fmt;
use std::str::FromStr;

use crate::news::NewsItem;

/// The fixed set of feeds the digest knows about.
///
/// The aggregator's default feed list and the viewer's tabs are both derived
/// from this enum, so adding a source means adding a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    WhatsNew,
    NewsBlog,
    Architecture,
    Security,
}

impl Category {
    /// Display order of the viewer tabs.
    pub const ALL: [Category; 4] = [
        Category::WhatsNew,
        Category::NewsBlog,
        Category::Architecture,
        Category::Security,
    ];

    /// Source name written into `news.json` for items from this feed.
    pub fn source_name(self) -> &'static str {
        match self {
            Category::WhatsNew => "AWS What's New",
            Category::NewsBlog => "AWS News Blog",
            Category::Architecture => "AWS Architecture Blog",
            Category::Security => "AWS Security Blog",
        }
    }

    /// Short key used for tabs, counts and CSS classes.
    pub fn key(self) -> &'static str {
        match self {
            Category::WhatsNew => "whats-new",
            Category::NewsBlog => "news-blog",
            Category::Architecture => "architecture",
            Category::Security => "security",
        }
    }

    pub fn default_feed_url(self) -> &'static str {
        match self {
            Category::WhatsNew => "https://aws.amazon.com/about-aws/whats-new/recent/feed/",
            Category::NewsBlog => "https://aws.amazon.com/blogs/aws/feed/",
            Category::Architecture => "https://aws.amazon.com/blogs/architecture/feed/",
            Category::Security => "https://aws.amazon.com/blogs/security/feed/",
        }
    }

    /// Tab label shown in the viewer.
    pub fn label(self) -> &'static str {
        match self {
            Category::WhatsNew => "What's New",
            Category::NewsBlog => "News Blog",
            Category::Architecture => "Architecture",
            Category::Security => "Security",
        }
    }

    /// Maps a raw `source` string to its category. Unknown sources are `None`.
    pub fn from_source(source: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.source_name() == source)
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|category| category.key() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown filter '{0}'")]
pub struct UnknownFilter(pub String);

/// Which subset of the loaded items the viewer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Only(Category),
}

impl Filter {
    pub fn key(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Only(category) => category.key(),
        }
    }

    pub fn matches(self, item: &NewsItem) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(category) => item.category() == Some(category),
        }
    }
}

impl FromStr for Filter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Filter::All);
        }
        Category::from_key(s)
            .map(Filter::Only)
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

/// Badge text for a card: the source with the brand prefix removed.
pub fn badge_label(source: &str) -> String {
    source.replacen("AWS ", "", 1)
}
