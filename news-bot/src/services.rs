use std::sync::Arc;

use tracing::{info, warn};

use crate::articles::ArticleFetcher;
use crate::catalog::FeedCatalog;
use crate::config::AppConfig;
use crate::fetcher::{Fetcher, Transport};
use crate::scrape::{ArticleScraper, MIN_ARTICLE_CHARS};
use crate::subscription::{JsonFileStore, SubscriptionManager};
use crate::summarizer::{HuggingFaceSummarizer, Summarizer};
use crate::types::{Article, NewsError, Result};

/// Outcome of summarizing an article's full page.
#[derive(Debug, Clone, PartialEq)]
pub enum AiSummary {
    Summary(String),
    /// The page had too little paragraph text to summarize.
    TooShort,
}

/// Everything a front end needs, shared between handlers.
#[derive(Clone)]
pub struct NewsServices {
    pub articles: Arc<ArticleFetcher>,
    pub subscriptions: Arc<SubscriptionManager>,
    pub scraper: Arc<ArticleScraper>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

impl NewsServices {
    pub fn new(
        articles: Arc<ArticleFetcher>,
        subscriptions: Arc<SubscriptionManager>,
        scraper: Arc<ArticleScraper>,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> Self {
        Self {
            articles,
            subscriptions,
            scraper,
            summarizer,
        }
    }

    /// Wire the live services: HTTP fetcher, builtin catalog, JSON store and,
    /// when a token is configured, the hosted summarizer.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let fetch_config = config.fetch_config();
        let respect_robots = fetch_config.respect_robots_txt;
        let transport: Arc<dyn Transport> = Arc::new(Fetcher::new(fetch_config)?);

        let store = JsonFileStore::open(&config.subscriptions_path).await?;
        let subscriptions = Arc::new(SubscriptionManager::new(Arc::new(store)));

        let summarizer: Option<Arc<dyn Summarizer>> = match &config.hf_token {
            Some(token) => {
                let summarizer = HuggingFaceSummarizer::new(
                    token.clone(),
                    config.hf_model.clone(),
                    config.timeout_seconds,
                )?;
                info!("AI summaries enabled via {}", summarizer.adapter_name());
                let summarizer: Arc<dyn Summarizer> = Arc::new(summarizer);
                Some(summarizer)
            }
            None => {
                warn!("HF_TOKEN not set, AI summaries disabled");
                None
            }
        };

        Ok(Self::new(
            Arc::new(ArticleFetcher::new(FeedCatalog::builtin(), transport.clone())),
            subscriptions,
            Arc::new(ArticleScraper::new(transport, respect_robots)),
            summarizer,
        ))
    }

    pub fn catalog(&self) -> &FeedCatalog {
        self.articles.catalog()
    }

    pub fn has_summarizer(&self) -> bool {
        self.summarizer.is_some()
    }

    /// Scrape the article page and summarize its paragraphs.
    pub async fn summarize_article(&self, article: &Article) -> Result<AiSummary> {
        let summarizer = self
            .summarizer
            .as_ref()
            .ok_or_else(|| NewsError::Summarization("no summarizer configured".to_string()))?;

        let text = self.scraper.fetch_article_text(&article.link).await?;
        if text.trim().chars().count() <= MIN_ARTICLE_CHARS {
            return Ok(AiSummary::TooShort);
        }

        let summary = summarizer.summarize(&text).await?;
        Ok(AiSummary::Summary(summary))
    }
}
