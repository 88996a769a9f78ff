//! Static table of news sources, their categories and feed URLs.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{NewsError, Result};

const DEFAULT_FEEDS: &[(&str, &[(&str, &str)])] = &[
    (
        "bbc",
        &[
            ("general", "http://feeds.bbci.co.uk/news/rss.xml"),
            ("world", "http://feeds.bbci.co.uk/news/world/rss.xml"),
            ("uk", "http://feeds.bbci.co.uk/news/uk/rss.xml"),
            ("business", "http://feeds.bbci.co.uk/news/business/rss.xml"),
            ("politics", "http://feeds.bbci.co.uk/news/politics/rss.xml"),
            ("health", "http://feeds.bbci.co.uk/news/health/rss.xml"),
            ("education", "http://feeds.bbci.co.uk/news/education/rss.xml"),
            ("science", "http://feeds.bbci.co.uk/news/science_and_environment/rss.xml"),
            ("technology", "http://feeds.bbci.co.uk/news/technology/rss.xml"),
            ("entertainment", "http://feeds.bbci.co.uk/news/entertainment_and_arts/rss.xml"),
        ],
    ),
    (
        "guardian",
        &[
            ("general", "https://www.theguardian.com/world/rss"),
            ("world", "https://www.theguardian.com/world/rss"),
            ("uk", "https://www.theguardian.com/uk-news/rss"),
            ("business", "https://www.theguardian.com/business/rss"),
            ("technology", "https://www.theguardian.com/technology/rss"),
            ("science", "https://www.theguardian.com/science/rss"),
            ("environment", "https://www.theguardian.com/environment/rss"),
            ("politics", "https://www.theguardian.com/politics/rss"),
        ],
    ),
    (
        "nytimes",
        &[
            ("general", "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml"),
            ("world", "https://rss.nytimes.com/services/xml/rss/nyt/World.xml"),
            ("us", "https://rss.nytimes.com/services/xml/rss/nyt/US.xml"),
            ("business", "https://rss.nytimes.com/services/xml/rss/nyt/Business.xml"),
            ("technology", "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml"),
            ("science", "https://rss.nytimes.com/services/xml/rss/nyt/Science.xml"),
            ("health", "https://rss.nytimes.com/services/xml/rss/nyt/Health.xml"),
        ],
    ),
    (
        "techcrunch",
        &[
            ("general", "https://techcrunch.com/feed/"),
            ("startups", "https://techcrunch.com/category/startups/feed/"),
            ("ai", "https://techcrunch.com/category/artificial-intelligence/feed/"),
            ("apps", "https://techcrunch.com/category/apps/feed/"),
            ("security", "https://techcrunch.com/category/security/feed/"),
        ],
    ),
    (
        "arstechnica",
        &[
            ("general", "https://feeds.arstechnica.com/arstechnica/index"),
            ("technology", "https://feeds.arstechnica.com/arstechnica/technology-lab"),
            ("science", "https://feeds.arstechnica.com/arstechnica/science"),
            ("policy", "https://feeds.arstechnica.com/arstechnica/tech-policy"),
        ],
    ),
    (
        "wired",
        &[
            ("general", "https://www.wired.com/feed/rss"),
            ("business", "https://www.wired.com/feed/business/rss"),
            ("gear", "https://www.wired.com/feed/gear/rss"),
            ("science", "https://www.wired.com/feed/science/rss"),
            ("security", "https://www.wired.com/feed/security/rss"),
        ],
    ),
    (
        "reuters",
        &[
            ("general", "https://www.reutersagency.com/feed/?taxonomy=best-topics&post_type=best"),
            ("world", "https://www.reutersagency.com/feed/?best-topics=international-news&post_type=best"),
            ("business", "https://www.reutersagency.com/feed/?best-topics=business-finance&post_type=best"),
            ("technology", "https://www.reutersagency.com/feed/?best-topics=tech&post_type=best"),
        ],
    ),
    (
        "aljazeera",
        &[
            ("general", "https://www.aljazeera.com/xml/rss/all.xml"),
            ("news", "https://www.aljazeera.com/xml/rss/all.xml"),
        ],
    ),
];

/// Mapping of (source, category) to a feed URL. Names are stored lowercase
/// and looked up case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct FeedCatalog {
    feeds: BTreeMap<String, BTreeMap<String, String>>,
}

impl FeedCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in catalog of RSS feeds.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (source, categories) in DEFAULT_FEEDS {
            for (category, url) in categories.iter() {
                catalog.insert(source, category, url);
            }
        }
        catalog
    }

    pub fn with_feed(mut self, source: &str, category: &str, url: &str) -> Self {
        self.insert(source, category, url);
        self
    }

    pub fn insert(&mut self, source: &str, category: &str, url: &str) {
        self.feeds
            .entry(source.to_lowercase())
            .or_default()
            .insert(category.to_lowercase(), url.to_string());
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.feeds.keys().map(String::as_str)
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.feeds.contains_key(&source.to_lowercase())
    }

    pub fn categories(&self, source: &str) -> Option<BTreeSet<String>> {
        self.feeds
            .get(&source.to_lowercase())
            .map(|cats| cats.keys().cloned().collect())
    }

    pub fn list_sources(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.feeds
            .iter()
            .map(|(source, cats)| (source.clone(), cats.keys().cloned().collect()))
            .collect()
    }

    /// Looks up the feed URL, failing with the valid alternatives listed.
    pub fn resolve(&self, source: &str, category: &str) -> Result<&str> {
        let source_key = source.to_lowercase();
        let categories = self
            .feeds
            .get(&source_key)
            .ok_or_else(|| NewsError::UnknownSource {
                name: source.to_string(),
                available: self.feeds.keys().cloned().collect(),
            })?;

        categories
            .get(&category.to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| NewsError::UnknownCategory {
                source_name: source_key,
                category: category.to_string(),
                available: categories.keys().cloned().collect(),
            })
    }
}
