use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::api::{CallbackQuery, InlineKeyboardMarkup, Message, Update};
use super::messages;
use crate::services::{AiSummary, NewsServices};
use crate::subscription::{Feature, Tier};
use crate::types::{Article, NewsError, Result};

/// Articles sent per category fetch.
pub const FREE_ARTICLES_PER_FETCH: usize = 3;
pub const PREMIUM_ARTICLES_PER_FETCH: usize = 5;

/// Matches taken from each source by `/search`.
pub const SEARCH_PER_SOURCE: usize = 1;

/// Something the bot wants done in a chat.
#[derive(Debug, Clone, PartialEq)]
pub enum BotAction {
    Send {
        chat_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Edit {
        chat_id: i64,
        message_id: i64,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    AnswerCallback {
        callback_id: String,
    },
}

impl BotAction {
    pub fn text(&self) -> Option<&str> {
        match self {
            BotAction::Send { text, .. } | BotAction::Edit { text, .. } => Some(text),
            BotAction::AnswerCallback { .. } => None,
        }
    }

    pub fn keyboard(&self) -> Option<&InlineKeyboardMarkup> {
        match self {
            BotAction::Send { keyboard, .. } | BotAction::Edit { keyboard, .. } => keyboard.as_ref(),
            BotAction::AnswerCallback { .. } => None,
        }
    }
}

/// Where bot actions are carried out.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn perform(&self, action: BotAction) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    News,
    Search(String),
    Sources,
    Premium,
    Status,
    Unknown(String),
}

impl Command {
    /// Parse a slash command, dropping any `@botname` suffix. Plain text is
    /// not a command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "news" => Command::News,
            "search" => Command::Search(args.split_whitespace().collect::<Vec<_>>().join(" ")),
            "sources" => Command::Sources,
            "premium" => Command::Premium,
            "status" => Command::Status,
            _ => Command::Unknown(name),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    ShowPremium,
    ActivatePremium,
    BackSources,
    Source(String),
    Category { source: String, category: String },
    Unknown(String),
}

impl Callback {
    /// Decode button data. In `category_<source>_<category>` the source is the
    /// first segment and the category is the remainder.
    pub fn parse(data: &str) -> Self {
        match data {
            "show_premium" => return Callback::ShowPremium,
            "activate_premium" => return Callback::ActivatePremium,
            "back_sources" => return Callback::BackSources,
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("category_") {
            if let Some((source, category)) = rest.split_once('_') {
                if !source.is_empty() && !category.is_empty() {
                    return Callback::Category {
                        source: source.to_string(),
                        category: category.to_string(),
                    };
                }
            }
        } else if let Some(source) = data.strip_prefix("source_") {
            if !source.is_empty() {
                return Callback::Source(source.to_string());
            }
        }
        Callback::Unknown(data.to_string())
    }
}

/// Message a callback came from; edits go there.
#[derive(Debug, Clone, Copy)]
struct Origin {
    chat_id: i64,
    message_id: i64,
}

pub struct NewsBot {
    services: NewsServices,
    payment_link: String,
}

impl NewsBot {
    pub fn new(services: NewsServices, payment_link: impl Into<String>) -> Self {
        Self {
            services,
            payment_link: payment_link.into(),
        }
    }

    /// Handle one update to completion. Handler failures are logged and the
    /// chat gets a generic apology.
    pub async fn handle_update(&self, update: &Update, sink: &dyn ChatSink) {
        if let Err(e) = self.dispatch(update, sink).await {
            error!("Update {} failed: {}", update.update_id, e);
            if let Some(chat_id) = update.chat_id() {
                let apology = BotAction::Send {
                    chat_id,
                    text: messages::generic_failure(),
                    keyboard: None,
                };
                if let Err(e) = sink.perform(apology).await {
                    warn!("Could not report failure to chat {}: {}", chat_id, e);
                }
            }
        }
    }

    async fn dispatch(&self, update: &Update, sink: &dyn ChatSink) -> Result<()> {
        if let Some(query) = &update.callback_query {
            return self.on_callback(query, sink).await;
        }
        if let Some(message) = &update.message {
            return self.on_message(message, sink).await;
        }
        debug!("Ignoring update {} with no message", update.update_id);
        Ok(())
    }

    async fn on_message(&self, message: &Message, sink: &dyn ChatSink) -> Result<()> {
        let Some(command) = message.text.as_deref().and_then(Command::parse) else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        let user_id = message
            .from
            .as_ref()
            .map(|user| user.id)
            .unwrap_or(chat_id)
            .to_string();

        info!("User {} sent {:?}", user_id, command);
        match command {
            Command::Start => {
                let tier = self.services.subscriptions.get_tier(&user_id).await;
                send(sink, chat_id, messages::welcome(tier), None).await
            }
            Command::Help => send(sink, chat_id, messages::help(), None).await,
            Command::Status => self.status(chat_id, &user_id, sink).await,
            Command::Premium => {
                send(
                    sink,
                    chat_id,
                    messages::premium_pitch(&self.payment_link),
                    Some(messages::premium_keyboard(&self.payment_link)),
                )
                .await
            }
            Command::Sources => self.sources(chat_id, &user_id, sink).await,
            Command::News => self.news(chat_id, &user_id, sink).await,
            Command::Search(keyword) => self.search(chat_id, &user_id, &keyword, sink).await,
            Command::Unknown(_) => send(sink, chat_id, messages::unknown_command(), None).await,
        }
    }

    async fn status(&self, chat_id: i64, user_id: &str, sink: &dyn ChatSink) -> Result<()> {
        let subscriptions = &self.services.subscriptions;
        let snapshot = subscriptions.get_limits(user_id).await;
        let sources = subscriptions
            .available_sources(user_id, self.services.catalog())
            .await;
        send(
            sink,
            chat_id,
            messages::status(&snapshot, sources.len()),
            Some(messages::upgrade_keyboard("⬆️ Upgrade to Premium")),
        )
        .await
    }

    async fn sources(&self, chat_id: i64, user_id: &str, sink: &dyn ChatSink) -> Result<()> {
        let tier = self.services.subscriptions.get_tier(user_id).await;
        let available = self
            .services
            .subscriptions
            .available_sources(user_id, self.services.catalog())
            .await;
        let text = messages::sources_overview(tier, &self.services.articles.list_sources(), &available);
        send(sink, chat_id, text, None).await
    }

    /// Daily-limit notice when the user has nothing left today.
    async fn limit_notice(&self, user_id: &str) -> Option<String> {
        let subscriptions = &self.services.subscriptions;
        if subscriptions
            .check_feature(user_id, Feature::DailyLimit)
            .await
            .is_granted()
        {
            return None;
        }
        let limits = subscriptions.get_limits(user_id).await;
        Some(messages::daily_limit_reached(limits.limits.daily_articles))
    }

    async fn source_menu(&self, user_id: &str) -> (String, InlineKeyboardMarkup) {
        let tier = self.services.subscriptions.get_tier(user_id).await;
        let sources = self
            .services
            .subscriptions
            .available_sources(user_id, self.services.catalog())
            .await;
        (messages::choose_source(), messages::source_keyboard(&sources, tier))
    }

    async fn news(&self, chat_id: i64, user_id: &str, sink: &dyn ChatSink) -> Result<()> {
        if let Some(notice) = self.limit_notice(user_id).await {
            return send(sink, chat_id, notice, Some(messages::upgrade_keyboard("⬆️ Upgrade"))).await;
        }
        let (text, keyboard) = self.source_menu(user_id).await;
        send(sink, chat_id, text, Some(keyboard)).await
    }

    async fn search(&self, chat_id: i64, user_id: &str, keyword: &str, sink: &dyn ChatSink) -> Result<()> {
        if let Some(notice) = self.limit_notice(user_id).await {
            return send(sink, chat_id, notice, Some(messages::upgrade_keyboard("⬆️ Upgrade"))).await;
        }
        if keyword.is_empty() {
            return send(sink, chat_id, messages::search_usage(), None).await;
        }

        let subscriptions = &self.services.subscriptions;
        let limits = subscriptions.get_limits(user_id).await;
        let max_results = subscriptions
            .check_feature(user_id, Feature::SearchResults)
            .await
            .limit()
            .unwrap_or(limits.limits.search_results)
            .min(limits.remaining_today()) as usize;

        send(sink, chat_id, messages::searching(keyword), None).await?;
        let report = self
            .services
            .articles
            .search_all_sources(keyword, SEARCH_PER_SOURCE)
            .await;

        if report.is_empty() {
            return send(sink, chat_id, messages::no_search_results(keyword), None).await;
        }

        let with_ai = self.ai_enabled(user_id).await;
        let total = report.total_matches();
        let mut sent = 0;
        for article in report.articles().take(max_results) {
            let ai_summary = self.ai_summary(article, with_ai).await;
            send(
                sink,
                chat_id,
                messages::search_result(article, ai_summary.as_deref()),
                None,
            )
            .await?;
            self.count_article(user_id).await;
            sent += 1;
        }

        if total > sent && limits.tier == Tier::Free {
            send(
                sink,
                chat_id,
                messages::search_truncated(sent, total),
                Some(messages::upgrade_keyboard("⬆️ Upgrade")),
            )
            .await?;
        }
        Ok(())
    }

    async fn on_callback(&self, query: &CallbackQuery, sink: &dyn ChatSink) -> Result<()> {
        sink.perform(BotAction::AnswerCallback {
            callback_id: query.id.clone(),
        })
        .await?;

        let Some(message) = &query.message else {
            debug!("Callback {} has no message to edit", query.id);
            return Ok(());
        };
        let origin = Origin {
            chat_id: message.chat.id,
            message_id: message.message_id,
        };
        let user_id = query.from.id.to_string();
        let callback = Callback::parse(query.data.as_deref().unwrap_or_default());

        debug!("User {} pressed {:?}", user_id, callback);
        match callback {
            Callback::ShowPremium => {
                edit(
                    sink,
                    origin,
                    messages::premium_inline(&self.payment_link),
                    Some(messages::premium_inline_keyboard(&self.payment_link)),
                )
                .await
            }
            Callback::ActivatePremium => edit(sink, origin, messages::activation_instructions(), None).await,
            Callback::BackSources => {
                let (text, keyboard) = self.source_menu(&user_id).await;
                edit(sink, origin, text, Some(keyboard)).await
            }
            Callback::Source(source) => self.show_categories(origin, &user_id, &source, sink).await,
            Callback::Category { source, category } => {
                self.fetch_and_send(origin, &user_id, &source, &category, sink)
                    .await
            }
            Callback::Unknown(data) => {
                warn!("Unknown callback data '{}' from user {}", data, user_id);
                Ok(())
            }
        }
    }

    /// Edit `origin` with a locked-feature prompt unless the user may read
    /// `source`. Returns whether access was granted.
    async fn gate_source(&self, origin: Origin, user_id: &str, source: &str, sink: &dyn ChatSink) -> Result<bool> {
        let decision = self
            .services
            .subscriptions
            .check_feature(user_id, Feature::Source(source))
            .await;
        if decision.is_granted() {
            return Ok(true);
        }
        edit(
            sink,
            origin,
            messages::locked_source(source),
            Some(messages::upgrade_keyboard("⬆️ Upgrade Now")),
        )
        .await?;
        Ok(false)
    }

    async fn show_categories(&self, origin: Origin, user_id: &str, source: &str, sink: &dyn ChatSink) -> Result<()> {
        let catalog = self.services.catalog();
        let Some(categories) = catalog.categories(source) else {
            let err = NewsError::UnknownSource {
                name: source.to_string(),
                available: catalog.sources().map(str::to_string).collect(),
            };
            return edit(sink, origin, messages::error(&err), None).await;
        };
        if !self.gate_source(origin, user_id, source, sink).await? {
            return Ok(());
        }

        let allowed = self.services.subscriptions.available_categories(user_id).await;
        let source = source.to_lowercase();
        edit(
            sink,
            origin,
            messages::choose_category(&source),
            Some(messages::category_keyboard(&source, &categories, allowed)),
        )
        .await
    }

    async fn fetch_and_send(
        &self,
        origin: Origin,
        user_id: &str,
        source: &str,
        category: &str,
        sink: &dyn ChatSink,
    ) -> Result<()> {
        if let Some(notice) = self.limit_notice(user_id).await {
            return edit(sink, origin, notice, Some(messages::upgrade_keyboard("⬆️ Upgrade"))).await;
        }
        if !self.gate_source(origin, user_id, source, sink).await? {
            return Ok(());
        }

        let subscriptions = &self.services.subscriptions;
        if !subscriptions
            .check_feature(user_id, Feature::Category(category))
            .await
            .is_granted()
        {
            return edit(
                sink,
                origin,
                messages::locked_category(category),
                Some(messages::upgrade_keyboard("⬆️ Upgrade Now")),
            )
            .await;
        }

        edit(sink, origin, messages::fetching(source, category), None).await?;

        let limits = subscriptions.get_limits(user_id).await;
        let per_fetch = if limits.tier.is_premium() {
            PREMIUM_ARTICLES_PER_FETCH
        } else {
            FREE_ARTICLES_PER_FETCH
        };
        let max_articles = per_fetch.min(limits.remaining_today() as usize);

        let articles = match self.services.articles.fetch(source, category, max_articles).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!("Fetch {}/{} for user {} failed: {}", source, category, user_id, e);
                return edit(sink, origin, messages::error(&e), None).await;
            }
        };
        if articles.is_empty() {
            return edit(sink, origin, messages::no_articles(source, category), None).await;
        }

        edit(sink, origin, messages::found_articles(articles.len(), source), None).await?;

        let with_ai = self.ai_enabled(user_id).await;
        let total = articles.len();
        for (i, article) in articles.iter().enumerate() {
            let ai_summary = self.ai_summary(article, with_ai).await;
            send(
                sink,
                origin.chat_id,
                messages::article(i + 1, total, article, ai_summary.as_deref()),
                None,
            )
            .await?;
            self.count_article(user_id).await;
        }
        info!("Sent {} {}/{} article(s) to user {}", total, source, category, user_id);
        Ok(())
    }

    async fn ai_enabled(&self, user_id: &str) -> bool {
        self.services.has_summarizer()
            && self
                .services
                .subscriptions
                .check_feature(user_id, Feature::AiSummaries)
                .await
                .is_granted()
    }

    async fn ai_summary(&self, article: &Article, enabled: bool) -> Option<String> {
        if !enabled {
            return None;
        }
        match self.services.summarize_article(article).await {
            Ok(AiSummary::Summary(summary)) => Some(summary),
            Ok(AiSummary::TooShort) => None,
            Err(e) => {
                warn!("No AI summary for {}: {}", article.link, e);
                None
            }
        }
    }

    async fn count_article(&self, user_id: &str) {
        if let Err(e) = self.services.subscriptions.increment_usage(user_id).await {
            warn!("Failed to record usage for {}: {}", user_id, e);
        }
    }
}

async fn send(
    sink: &dyn ChatSink,
    chat_id: i64,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    sink.perform(BotAction::Send {
        chat_id,
        text,
        keyboard,
    })
    .await
}

async fn edit(
    sink: &dyn ChatSink,
    origin: Origin,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    sink.perform(BotAction::Edit {
        chat_id: origin.chat_id,
        message_id: origin.message_id,
        text,
        keyboard,
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_drop_bot_suffix_and_keep_arguments() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/news@daily_news_bot"), Some(Command::News));
        assert_eq!(
            Command::parse("/search@daily_news_bot  artificial   intelligence "),
            Some(Command::Search("artificial intelligence".to_string()))
        );
        assert_eq!(Command::parse("/search"), Some(Command::Search(String::new())));
        assert_eq!(Command::parse("/nope"), Some(Command::Unknown("nope".to_string())));
        assert_eq!(Command::parse("hello there"), None);
    }

    #[test]
    fn callbacks_split_on_first_segment() {
        assert_eq!(Callback::parse("show_premium"), Callback::ShowPremium);
        assert_eq!(Callback::parse("source_bbc"), Callback::Source("bbc".to_string()));
        assert_eq!(
            Callback::parse("category_bbc_science_environment"),
            Callback::Category {
                source: "bbc".to_string(),
                category: "science_environment".to_string(),
            }
        );
        assert_eq!(
            Callback::parse("category_bbc"),
            Callback::Unknown("category_bbc".to_string())
        );
        assert_eq!(Callback::parse("source_"), Callback::Unknown("source_".to_string()));
    }
}
