use crate::text::extract_text_from_html;
use crate::types::{Article, NewsError, Result};
use feed_rs::parser;
use tracing::debug;

pub struct FeedParser;

impl FeedParser {
    /// Parse an RSS/Atom document into articles, keeping upstream order.
    pub fn parse_articles(content: &str, source: &str, category: &str) -> Result<Vec<Article>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| NewsError::Parse(format!("Failed to parse feed: {}", e)))?;

        let articles: Vec<Article> = feed
            .entries
            .into_iter()
            .map(|entry| Self::parse_entry(entry, source, category))
            .collect();

        debug!("Parsed {} entries for {}/{}", articles.len(), source, category);
        Ok(articles)
    }

    fn parse_entry(entry: feed_rs::model::Entry, source: &str, category: &str) -> Article {
        let title = entry
            .title
            .map(|t| extract_text_from_html(&t.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "No title".to_string());

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        // summary, then the full content body
        let summary = entry
            .summary
            .map(|s| s.content)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content.and_then(|c| c.body))
            .map(|s| extract_text_from_html(&s))
            .unwrap_or_default();

        Article {
            title,
            link,
            published: entry.published.or(entry.updated),
            summary,
            source: source.to_string(),
            category: category.to_string(),
        }
    }
}
