use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single article as served to a reader. Built per request from a feed
/// entry and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub summary: String,
    pub source: String,
    pub category: String,
}

impl Article {
    /// Case-insensitive substring match on title or summary.
    /// `keyword_lower` must already be lowercased.
    pub fn matches_keyword(&self, keyword_lower: &str) -> bool {
        self.title.to_lowercase().contains(keyword_lower)
            || self.summary.to_lowercase().contains(keyword_lower)
    }

    pub fn published_display(&self) -> String {
        self.published
            .map(|dt| dt.format("%a, %d %b %Y %H:%M UTC").to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub respect_robots_txt: bool,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "newsagent/0.1".to_string(),
            timeout_seconds: 10,
            respect_robots_txt: true,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Body and status of a plain GET, before any success check.
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub status: u16,
    pub body: String,
}

impl TextResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_success(self, url: &str) -> Result<String> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(NewsError::HttpStatus {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("Source '{name}' not available. Available sources: {}", .available.join(", "))]
    UnknownSource { name: String, available: Vec<String> },

    #[error(
        "Category '{category}' not available for {source_name}. Available categories: {}",
        .available.join(", ")
    )]
    UnknownCategory {
        source_name: String,
        category: String,
        available: Vec<String>,
    },

    #[error("No articles found in {source_name} {category} feed. The RSS feed might be temporarily unavailable.")]
    FeedUnavailable { source_name: String, category: String },

    #[error("Timed out fetching {url}")]
    NetworkTimeout { url: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Scraping forbidden by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NewsError {
    /// Maps a transport failure for `url`, keeping timeouts distinguishable.
    pub fn request(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NewsError::NetworkTimeout {
                url: url.to_string(),
            }
        } else {
            NewsError::Http(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, summary: &str) -> Article {
        Article {
            title: title.to_string(),
            link: "https://example.com/a".to_string(),
            published: None,
            summary: summary.to_string(),
            source: "bbc".to_string(),
            category: "general".to_string(),
        }
    }

    #[test]
    fn keyword_matches_title_or_summary() {
        let a = article("New AI chip unveiled", "Hardware news");
        assert!(a.matches_keyword("ai"));
        assert!(a.matches_keyword("hardware"));
        assert!(!a.matches_keyword("football"));
    }

    #[test]
    fn unknown_category_lists_valid_ones() {
        let err = NewsError::UnknownCategory {
            source_name: "bbc".to_string(),
            category: "nope".to_string(),
            available: vec!["general".to_string(), "world".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'nope'"));
        assert!(msg.contains("general, world"));
    }

    #[test]
    fn non_success_status_becomes_error() {
        let resp = TextResponse {
            status: 503,
            body: String::new(),
        };
        assert!(matches!(
            resp.into_success("https://x.test"),
            Err(NewsError::HttpStatus { status: 503, .. })
        ));
    }
}
