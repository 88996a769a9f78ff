//! Full-text retrieval for article pages, gated by robots.txt.

use std::collections::HashMap;
use std::sync::Arc;

use scraper::{Html, Selector};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::fetcher::Transport;
use crate::robots::RobotsRules;
use crate::types::{NewsError, Result};

/// User agent matched against robots.txt groups.
pub const ROBOTS_USER_AGENT: &str = "newsagent";

/// Shorter page text is not worth summarizing.
pub const MIN_ARTICLE_CHARS: usize = 100;

pub struct ArticleScraper {
    transport: Arc<dyn Transport>,
    respect_robots_txt: bool,
    robots_cache: RwLock<HashMap<String, RobotsRules>>,
}

impl ArticleScraper {
    pub fn new(transport: Arc<dyn Transport>, respect_robots_txt: bool) -> Self {
        Self {
            transport,
            respect_robots_txt,
            robots_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch `url` and return the text of its paragraphs, one per line.
    pub async fn fetch_article_text(&self, url: &str) -> Result<String> {
        if self.respect_robots_txt {
            self.check_robots_txt(url).await?;
        }

        let html = self.transport.get(url).await?.into_success(url)?;
        let text = extract_paragraphs(&html)?;
        debug!("Extracted {} chars of text from {}", text.len(), url);
        Ok(text)
    }

    async fn check_robots_txt(&self, url: &str) -> Result<()> {
        let parsed_url = Url::parse(url)?;
        let origin = parsed_url.origin().ascii_serialization();

        // Check cache first
        let cached = self.robots_cache.read().await.get(&origin).cloned();
        let rules = match cached {
            Some(rules) => rules,
            None => {
                let rules = self.load_robots(&origin).await?;
                self.robots_cache
                    .write()
                    .await
                    .insert(origin.clone(), rules.clone());
                rules
            }
        };

        let mut path = parsed_url.path().to_string();
        if let Some(query) = parsed_url.query() {
            path.push('?');
            path.push_str(query);
        }

        if rules.is_allowed(ROBOTS_USER_AGENT, &path) {
            Ok(())
        } else {
            Err(NewsError::RobotsDisallowed {
                url: url.to_string(),
            })
        }
    }

    async fn load_robots(&self, origin: &str) -> Result<RobotsRules> {
        let robots_url = format!("{}/robots.txt", origin);
        let response = self.transport.get(&robots_url).await?;

        let rules = match response.status {
            200..=299 => RobotsRules::parse(&response.body),
            401 | 403 => RobotsRules::disallow_all(),
            400..=499 => RobotsRules::allow_all(),
            status => {
                warn!("robots.txt at {} answered HTTP {}, treating site as closed", robots_url, status);
                RobotsRules::disallow_all()
            }
        };
        Ok(rules)
    }
}

/// Join the text of every `<p>` element with newlines.
pub fn extract_paragraphs(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("p").map_err(|e| NewsError::Parse(format!("invalid selector: {}", e)))?;

    let paragraphs: Vec<String> = document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .collect();
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_are_joined_by_newlines() {
        let html = "<html><body><h1>Head</h1><p>One <a href='#'>link</a>.</p><div><p>Two.</p></div></body></html>";
        assert_eq!(extract_paragraphs(html).unwrap(), "One link.\nTwo.");
    }

    #[test]
    fn page_without_paragraphs_is_empty() {
        assert_eq!(extract_paragraphs("<html><body>bare</body></html>").unwrap(), "");
    }
}
