//! Article retrieval over the feed catalog: plain fetch, keyword search in one
//! source and fan-out search across sources.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::FeedCatalog;
use crate::fetcher::Transport;
use crate::parser::FeedParser;
use crate::types::{Article, NewsError, Result};

/// Batch size fetched before keyword filtering. Feeds have no server-side
/// search, so filtering needs a wider candidate pool than the result limit.
pub const SEARCH_OVERSAMPLE: usize = 50;

/// Category searched for every source during a cross-source search.
pub const SEARCH_CATEGORY: &str = "general";

/// Outcome of a multi-source search: matches per source plus the sources
/// that could not be searched.
#[derive(Debug, Default)]
pub struct SearchReport {
    pub matches: BTreeMap<String, Vec<Article>>,
    pub failures: Vec<(String, NewsError)>,
}

impl SearchReport {
    pub fn total_matches(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// All matches flattened in source order.
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.matches.values().flatten()
    }
}

pub struct ArticleFetcher {
    catalog: FeedCatalog,
    transport: Arc<dyn Transport>,
}

impl ArticleFetcher {
    pub fn new(catalog: FeedCatalog, transport: Arc<dyn Transport>) -> Self {
        Self { catalog, transport }
    }

    pub fn catalog(&self) -> &FeedCatalog {
        &self.catalog
    }

    pub fn list_sources(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.catalog.list_sources()
    }

    pub async fn fetch(&self, source: &str, category: &str, limit: usize) -> Result<Vec<Article>> {
        let feed_url = self.catalog.resolve(source, category)?;
        let source_name = source.to_lowercase();
        let category_name = category.to_lowercase();

        debug!("Fetching {}/{} from {}", source_name, category_name, feed_url);
        let body = self.transport.get(feed_url).await?.into_success(feed_url)?;

        let articles = match FeedParser::parse_articles(&body, &source_name, &category_name) {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Unreadable feed for {}/{}: {}", source_name, category_name, e);
                Vec::new()
            }
        };

        if articles.is_empty() {
            return Err(NewsError::FeedUnavailable {
                source_name,
                category: category_name,
            });
        }

        Ok(articles.into_iter().take(limit).collect())
    }

    pub async fn search_one_source(
        &self,
        keyword: &str,
        source: &str,
        category: &str,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let candidates = self.fetch(source, category, SEARCH_OVERSAMPLE).await?;
        let keyword_lower = keyword.to_lowercase();

        let matches: Vec<Article> = candidates
            .into_iter()
            .filter(|article| article.matches_keyword(&keyword_lower))
            .take(limit)
            .collect();

        debug!(
            "Keyword '{}' matched {} article(s) in {}/{}",
            keyword,
            matches.len(),
            source,
            category
        );
        Ok(matches)
    }

    /// Search every cataloged source's general feed.
    pub async fn search_all_sources(&self, keyword: &str, limit_per_source: usize) -> SearchReport {
        let sources: Vec<String> = self.catalog.sources().map(str::to_string).collect();
        self.search_sources(keyword, &sources, limit_per_source).await
    }

    /// Search the given sources' general feeds. A failing source is recorded
    /// in the report and the scan continues.
    pub async fn search_sources(
        &self,
        keyword: &str,
        sources: &[String],
        limit_per_source: usize,
    ) -> SearchReport {
        let mut report = SearchReport::default();

        for source in sources {
            match self
                .search_one_source(keyword, source, SEARCH_CATEGORY, limit_per_source)
                .await
            {
                Ok(articles) if articles.is_empty() => {}
                Ok(articles) => {
                    report.matches.insert(source.to_lowercase(), articles);
                }
                Err(e) => {
                    warn!("Skipping {} during search for '{}': {}", source, keyword, e);
                    report.failures.push((source.to_lowercase(), e));
                }
            }
        }

        info!(
            "Search for '{}' found {} article(s) in {} source(s), {} source(s) failed",
            keyword,
            report.total_matches(),
            report.matches.len(),
            report.failures.len()
        );
        report
    }
}
