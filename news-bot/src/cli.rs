//! Interactive terminal reader.

use std::io::{BufRead, Write};

use tracing::{info, warn};

use crate::articles::SearchReport;
use crate::render;
use crate::services::{AiSummary, NewsServices};
use crate::subscription::Feature;
use crate::text::truncate_chars;
use crate::types::{Article, Result};

pub const DEFAULT_ARTICLE_COUNT: usize = 5;
pub const DEFAULT_PER_SOURCE: usize = 2;
const ERROR_PREVIEW_CHARS: usize = 100;

/// Line-oriented prompt/print pair over any reader and writer.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `text` and read one trimmed line. `None` at end of input.
    pub fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt for a positive number, falling back to `default` on blank or
    /// unparsable input.
    pub fn prompt_count(&mut self, text: &str, default: usize) -> Result<Option<usize>> {
        Ok(self.prompt(text)?.map(|raw| {
            raw.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(default)
        }))
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    pub fn print(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{}", text)?;
        Ok(())
    }
}

/// What to read in a single fetch request.
struct ReadRequest {
    source: String,
    category: String,
    keyword: Option<String>,
    count: usize,
    ai_summaries: bool,
}

pub struct ReaderCli<R, W> {
    services: NewsServices,
    user_id: String,
    console: Console<R, W>,
}

impl<R: BufRead, W: Write> ReaderCli<R, W> {
    pub fn new(services: NewsServices, user_id: impl Into<String>, input: R, output: W) -> Self {
        Self {
            services,
            user_id: user_id.into(),
            console: Console::new(input, output),
        }
    }

    pub fn into_output(self) -> W {
        self.console.into_output()
    }

    /// Run the menu until the user exits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        info!("Reader CLI started for user {}", self.user_id);
        self.console.say("╔════════════════════════════════════════════════════════════╗")?;
        self.console.say("║           📰 NEWS BOT - RSS Feed Edition 📰                ║")?;
        self.console.say("╚════════════════════════════════════════════════════════════╝")?;

        loop {
            self.console.say("\nOptions:")?;
            self.console.say("  1. View available sources")?;
            self.console.say("  2. Get news by source and category")?;
            self.console.say("  3. Search news by keyword in one source")?;
            self.console.say("  4. Search keyword across ALL sources")?;
            self.console.say("  5. Exit")?;

            let Some(choice) = self.console.prompt("\nSelect option (1-5): ")? else {
                break;
            };

            match choice.as_str() {
                "1" => {
                    let listing = render::sources_listing(&self.services.articles.list_sources());
                    self.console.print(&listing)?;
                }
                "2" => self.fetch_by_category().await?,
                "3" => self.search_one_source().await?,
                "4" => self.search_everywhere().await?,
                "5" => break,
                _ => self.console.say("❌ Invalid option. Please choose 1-5.")?,
            }
        }

        self.console.say("\n👋 Goodbye!")?;
        Ok(())
    }

    async fn fetch_by_category(&mut self) -> Result<()> {
        let Some(source) = self
            .console
            .prompt("\nEnter news source (e.g., bbc, guardian, techcrunch): ")?
        else {
            return Ok(());
        };
        let Some(category) = self
            .console
            .prompt("Enter category (e.g., technology, world, business): ")?
        else {
            return Ok(());
        };
        let Some(count) = self
            .console
            .prompt_count("How many articles? (default: 5): ", DEFAULT_ARTICLE_COUNT)?
        else {
            return Ok(());
        };
        let Some(ai) = self.console.prompt("Generate AI summaries? (slower) [y/N]: ")? else {
            return Ok(());
        };

        self.read_articles(ReadRequest {
            source,
            category: or_general(category),
            keyword: None,
            count,
            ai_summaries: matches!(ai.to_lowercase().as_str(), "y" | "yes"),
        })
        .await
    }

    async fn search_one_source(&mut self) -> Result<()> {
        let Some(keyword) = self.console.prompt("\nEnter keyword to search: ")? else {
            return Ok(());
        };
        let Some(source) = self.console.prompt("Enter news source (e.g., bbc, guardian): ")? else {
            return Ok(());
        };
        let Some(category) = self.console.prompt("Enter category (default: general): ")? else {
            return Ok(());
        };
        let Some(count) = self
            .console
            .prompt_count("How many articles? (default: 5): ", DEFAULT_ARTICLE_COUNT)?
        else {
            return Ok(());
        };

        if keyword.is_empty() {
            return self.console.say("❌ Please enter a keyword");
        }

        self.read_articles(ReadRequest {
            source,
            category: or_general(category),
            keyword: Some(keyword),
            count,
            ai_summaries: false,
        })
        .await
    }

    async fn search_everywhere(&mut self) -> Result<()> {
        let Some(keyword) = self
            .console
            .prompt("\nEnter keyword to search across all sources: ")?
        else {
            return Ok(());
        };
        let Some(per_source) = self
            .console
            .prompt_count("Max results per source? (default: 2): ", DEFAULT_PER_SOURCE)?
        else {
            return Ok(());
        };

        if keyword.is_empty() {
            return self.console.say("❌ Please enter a keyword");
        }
        let Some(remaining) = self.remaining_today().await? else {
            return Ok(());
        };

        self.console
            .say(&format!("\n🔍 Searching all sources for: '{}'...", keyword))?;
        let report = self
            .services
            .articles
            .search_all_sources(&keyword, per_source)
            .await;

        self.console.print(&render::search_failures(&report))?;
        if report.is_empty() {
            return self
                .console
                .say(&format!("❌ No articles found containing '{}'", keyword));
        }

        self.console
            .say(&format!("✓ Found results in {} source(s)\n", report.matches.len()))?;
        self.show_search_report(&report, remaining).await
    }

    async fn show_search_report(&mut self, report: &SearchReport, remaining: usize) -> Result<()> {
        let mut budget = remaining;
        for (source, articles) in &report.matches {
            if budget == 0 {
                break;
            }
            let shown = &articles[..articles.len().min(budget)];
            self.console.print(&render::search_source_block(source, shown))?;
            self.console.say("")?;
            for _ in shown {
                self.count_article().await;
            }
            budget -= shown.len();
        }

        if report.total_matches() > remaining {
            self.console.say(&format!(
                "📊 Daily limit reached after {} article(s); {} more not shown",
                remaining,
                report.total_matches() - remaining
            ))?;
        }
        Ok(())
    }

    async fn read_articles(&mut self, request: ReadRequest) -> Result<()> {
        let Some(remaining) = self.remaining_today().await? else {
            return Ok(());
        };

        self.console.say(&format!(
            "\n🔍 Fetching {} - {} news...",
            request.source.to_uppercase(),
            request.category
        ))?;

        let fetched = match &request.keyword {
            Some(keyword) => {
                self.console
                    .say(&format!("   Searching for keyword: '{}'", keyword))?;
                self.services
                    .articles
                    .search_one_source(keyword, &request.source, &request.category, request.count)
                    .await
            }
            None => {
                self.services
                    .articles
                    .fetch(&request.source, &request.category, request.count)
                    .await
            }
        };

        let articles = match fetched {
            Ok(articles) => articles,
            Err(e) => return self.console.say(&format!("❌ Error: {}", e)),
        };

        if articles.is_empty() {
            self.console.say("❌ No articles found")?;
            if request.keyword.is_some() {
                self.console
                    .say("   Try a different keyword or check other categories")?;
            }
            return Ok(());
        }

        let with_ai = request.ai_summaries && self.ai_summaries_allowed().await?;
        let total = articles.len();
        let shown = total.min(remaining);

        self.console.say(&format!("✓ Found {} article(s)\n", total))?;
        for (i, article) in articles.iter().take(shown).enumerate() {
            self.console.print(&render::article_block(i + 1, shown, article))?;
            if with_ai {
                self.show_ai_summary(article).await?;
            }
            self.count_article().await;
        }

        if shown < total {
            self.console.say(&format!(
                "📊 Daily limit reached after {} article(s); {} more not shown",
                shown,
                total - shown
            ))?;
        }
        Ok(())
    }

    /// Articles the user may still read today, or `None` after printing the
    /// limit notice.
    async fn remaining_today(&mut self) -> Result<Option<usize>> {
        let subscriptions = &self.services.subscriptions;
        if subscriptions
            .check_feature(&self.user_id, Feature::DailyLimit)
            .await
            .is_granted()
        {
            let remaining = subscriptions.get_limits(&self.user_id).await.remaining_today();
            return Ok(Some(remaining as usize));
        }

        let limits = subscriptions.get_limits(&self.user_id).await;
        self.console.say(&format!(
            "❌ Daily limit reached ({} articles)",
            limits.limits.daily_articles
        ))?;
        Ok(None)
    }

    async fn ai_summaries_allowed(&mut self) -> Result<bool> {
        if !self.services.has_summarizer() {
            self.console
                .say("⚠ AI summaries are unavailable: HF_TOKEN is not configured")?;
            return Ok(false);
        }
        let granted = self
            .services
            .subscriptions
            .check_feature(&self.user_id, Feature::AiSummaries)
            .await
            .is_granted();
        if !granted {
            self.console
                .say("⚠ AI summaries are a Premium feature; showing feed summaries only")?;
        }
        Ok(granted)
    }

    async fn show_ai_summary(&mut self, article: &Article) -> Result<()> {
        self.console.say("🤖 Generating AI summary...")?;
        match self.services.summarize_article(article).await {
            Ok(AiSummary::Summary(summary)) => {
                self.console.say("AI Summary:")?;
                self.console.say(&summary)?;
                self.console.say("")
            }
            Ok(AiSummary::TooShort) => self.console.say("⚠ Article content too short for AI summary\n"),
            Err(e) => self.console.say(&format!(
                "⚠ Could not generate AI summary: {}\n",
                truncate_chars(&e.to_string(), ERROR_PREVIEW_CHARS)
            )),
        }
    }

    async fn count_article(&self) {
        if let Err(e) = self.services.subscriptions.increment_usage(&self.user_id).await {
            warn!("Failed to record usage for {}: {}", self.user_id, e);
        }
    }
}

fn or_general(category: String) -> String {
    if category.is_empty() {
        "general".to_string()
    } else {
        category
    }
}
