//! Chat texts and keyboards, rendered for HTML parse mode.

use std::collections::{BTreeMap, BTreeSet};

use super::api::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::render::date_long;
use crate::subscription::{Allowance, LimitsSnapshot, Tier};
use crate::text::{escape_html, truncate_chars};
use crate::types::Article;

/// Summary length in `/news` article messages.
pub const NEWS_SUMMARY_CHARS: usize = 500;

/// Summary length in `/search` result messages.
pub const SEARCH_SUMMARY_CHARS: usize = 400;

/// Categories listed per source in `/sources`.
const LISTED_CATEGORIES: usize = 3;

/// Error text shown to chat users is cut to this length.
pub const ERROR_PREVIEW_CHARS: usize = 100;

fn tier_badge(tier: Tier) -> &'static str {
    if tier.is_premium() {
        "🌟"
    } else {
        "📱"
    }
}

fn source_emoji(source: &str) -> &'static str {
    match source {
        "guardian" => "🗞️",
        "techcrunch" => "💻",
        "wired" => "🔧",
        "nytimes" => "🌍",
        "reuters" => "📡",
        "arstechnica" => "⚙️",
        "aljazeera" => "🌐",
        _ => "📰",
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn welcome(tier: Tier) -> String {
    let mut text = format!(
        "📰 <b>Welcome to News Bot!</b>\n\n\
         Get the latest news summaries from top sources.\n\n\
         Current Plan: <b>{}</b> {}\n\n\
         <b>Commands:</b>\n\
         /news - Browse news by source\n\
         /search - Search for specific topics\n\
         /sources - View available sources\n\
         /premium - Upgrade to Premium\n\
         /status - Check your subscription\n\
         /help - Show help message\n\n",
        tier.as_str().to_uppercase(),
        tier_badge(tier)
    );

    if !tier.is_premium() {
        text.push_str(
            "🎁 <b>Free Plan Includes:</b>\n\
             • 10 articles per day\n\
             • BBC &amp; Guardian sources\n\
             • General &amp; World news\n\n\
             ✨ Upgrade to Premium for unlimited access!",
        );
    }
    text
}

pub fn help() -> String {
    "📰 <b>News Bot Help</b>\n\n\
     <b>Commands:</b>\n\
     • /news - Browse news by source and category\n\
     • /search &lt;keyword&gt; - Search for specific topics\n\
     • /sources - View available news sources\n\
     • /premium - Upgrade to Premium\n\
     • /status - Check subscription status\n\
     • /help - Show this message\n\n\
     <b>Examples:</b>\n\
     • /search artificial intelligence\n\
     • /search bitcoin\n\
     • /news (then select source)\n\n\
     <b>Premium Features:</b>\n\
     Upgrade with /premium for unlimited access!"
        .to_string()
}

pub fn unknown_command() -> String {
    "❓ Unknown command. Use /help to see what I can do.".to_string()
}

pub fn status(snapshot: &LimitsSnapshot, available_sources: usize) -> String {
    let tier = snapshot.tier;
    let mut text = format!(
        "📊 <b>Your Subscription Status</b>\n\n\
         Plan: <b>{}</b> {}\n\n\
         Today's Usage: {}/{} articles\n",
        tier.as_str().to_uppercase(),
        tier_badge(tier),
        snapshot.current_usage,
        snapshot.limits.daily_articles
    );

    if tier.is_premium() {
        if let Some(expiry) = snapshot.expires_at {
            text.push_str(&format!("Expires: {}\n", date_long(expiry)));
        }
        text.push_str(
            "Available Sources: All\n\
             AI Summaries: ✅\n\n\
             🌟 <b>Premium Features Active:</b>\n\
             • 100 articles daily\n\
             • All news sources\n\
             • All categories\n\
             • AI-powered summaries\n\
             • Priority support\n",
        );
    } else {
        text.push_str(&format!(
            "Available Sources: {}\n\
             AI Summaries: {}\n\
             Search Results: {} per query\n\n\
             🎯 <b>Free Plan Features:</b>\n\
             • 10 articles daily\n\
             • BBC &amp; Guardian\n\
             • General &amp; World categories\n\
             • Basic summaries\n",
            available_sources,
            if snapshot.limits.ai_summaries { "✅" } else { "❌" },
            snapshot.limits.search_results
        ));
    }
    text
}

pub fn upgrade_keyboard(label: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::single(InlineKeyboardButton::callback(label, "show_premium"))
}

pub fn premium_pitch(payment_link: &str) -> String {
    format!(
        "✨ <b>Upgrade to Premium</b>\n\n\
         Unlock all features and support development!\n\n\
         🌟 <b>Premium Benefits:</b>\n\
         • 100 articles per day (vs 10)\n\
         • Access ALL news sources\n\
         • All categories unlocked\n\
         • AI-powered summaries\n\
         • 10 search results (vs 3)\n\
         • Priority support\n\n\
         💰 <b>Pricing:</b>\n\
         • $3/month - Monthly\n\
         • $30/year - Annual (2 months free!)\n\n\
         Support indie development! ❤️\n\n\
         <a href=\"{}\">Subscribe via Buy Me a Coffee</a>",
        escape_html(payment_link)
    )
}

pub fn premium_keyboard(payment_link: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::link("💳 Subscribe Now", payment_link)],
        vec![InlineKeyboardButton::callback("🔄 I Already Subscribed", "activate_premium")],
    ])
}

pub fn premium_inline(payment_link: &str) -> String {
    format!(
        "✨ <b>Premium Plan</b>\n\n\
         🌟 <b>Benefits:</b>\n\
         • 100 articles/day\n\
         • All sources\n\
         • All categories\n\
         • AI summaries\n\n\
         💰 $3/month or $30/year\n\n\
         <a href=\"{}\">Subscribe Now</a>",
        escape_html(payment_link)
    )
}

pub fn premium_inline_keyboard(payment_link: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::link("💳 Subscribe", payment_link)],
        vec![InlineKeyboardButton::callback("🔙 Back", "back_sources")],
    ])
}

pub fn activation_instructions() -> String {
    "🔑 <b>Activate Premium</b>\n\n\
     After subscribing on Buy Me a Coffee:\n\
     1. Note your subscription email\n\
     2. Send your Telegram user ID, subscription email and payment confirmation to support\n\n\
     We'll activate your account within 24 hours!"
        .to_string()
}

pub fn sources_overview(
    tier: Tier,
    all_sources: &BTreeMap<String, BTreeSet<String>>,
    available: &[String],
) -> String {
    let mut text = format!(
        "📰 <b>Available Sources ({} Plan)</b>\n\n",
        tier.as_str().to_uppercase()
    );

    for (source, categories) in all_sources {
        if tier.is_premium() || available.contains(source) {
            text.push_str(&format!("✅ <b>{}</b>\n", escape_html(&source.to_uppercase())));
        } else {
            text.push_str(&format!(
                "🔒 <b>{}</b> (Premium)\n",
                escape_html(&source.to_uppercase())
            ));
        }

        let listed: Vec<&str> = categories
            .iter()
            .take(LISTED_CATEGORIES)
            .map(String::as_str)
            .collect();
        text.push_str(&format!("  Categories: {}", escape_html(&listed.join(", "))));
        if categories.len() > LISTED_CATEGORIES {
            text.push_str("...");
        }
        text.push_str("\n\n");
    }

    if !tier.is_premium() {
        text.push_str("\n🌟 Upgrade to /premium for access to all sources!");
    }
    text
}

pub fn daily_limit_reached(daily_articles: u32) -> String {
    format!(
        "❌ Daily limit reached ({} articles)\n\n\
         Upgrade to Premium for 100 articles/day!\n\
         Use /premium to learn more.",
        daily_articles
    )
}

pub fn choose_source() -> String {
    "Choose a news source:".to_string()
}

/// Readable sources laid out two per row, plus an unlock button for free users.
pub fn source_keyboard(sources: &[String], tier: Tier) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = sources
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|source| {
                    InlineKeyboardButton::callback(
                        format!("{} {}", source_emoji(source), source.to_uppercase()),
                        format!("source_{}", source),
                    )
                })
                .collect()
        })
        .collect();

    if !tier.is_premium() {
        rows.push(vec![InlineKeyboardButton::callback(
            "🌟 Unlock All Sources",
            "show_premium",
        )]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn choose_category(source: &str) -> String {
    format!(
        "Choose a category from <b>{}</b>:",
        escape_html(&source.to_uppercase())
    )
}

/// Category buttons two per row; locked ones are marked, then a back button.
pub fn category_keyboard(
    source: &str,
    categories: &BTreeSet<String>,
    allowed: Allowance,
) -> InlineKeyboardMarkup {
    let categories: Vec<&String> = categories.iter().collect();
    let mut rows: Vec<Vec<InlineKeyboardButton>> = categories
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|category| {
                    let label = if allowed.permits(category) {
                        capitalize(category)
                    } else {
                        format!("🔒 {}", capitalize(category))
                    };
                    InlineKeyboardButton::callback(label, format!("category_{}_{}", source, category))
                })
                .collect()
        })
        .collect();

    rows.push(vec![InlineKeyboardButton::callback("⬅️ Back", "back_sources")]);
    InlineKeyboardMarkup::new(rows)
}

pub fn locked_source(source: &str) -> String {
    format!(
        "🔒 <b>{}</b> is a Premium feature\n\nUpgrade to access all news sources!",
        escape_html(&source.to_uppercase())
    )
}

pub fn locked_category(category: &str) -> String {
    format!(
        "🔒 <b>{}</b> category is Premium only\n\nUpgrade to access all categories!",
        escape_html(&category.to_uppercase())
    )
}

pub fn fetching(source: &str, category: &str) -> String {
    format!(
        "🔍 Fetching {} - {} news...",
        escape_html(&source.to_uppercase()),
        escape_html(category)
    )
}

pub fn found_articles(count: usize, source: &str) -> String {
    format!(
        "✅ Found {} articles from {}!\nSending them now...",
        count,
        escape_html(&source.to_uppercase())
    )
}

pub fn no_articles(source: &str, category: &str) -> String {
    format!(
        "❌ No articles found for {} - {}",
        escape_html(source),
        escape_html(category)
    )
}

pub fn error(err: &impl std::fmt::Display) -> String {
    format!(
        "❌ Error: {}",
        escape_html(&truncate_chars(&err.to_string(), ERROR_PREVIEW_CHARS))
    )
}

pub fn generic_failure() -> String {
    "❌ An error occurred. Please try again later.".to_string()
}

fn read_more(link: &str) -> String {
    format!("<a href=\"{}\">Read more</a>", escape_html(link))
}

fn summary_block(summary: &str, max_chars: usize) -> String {
    if summary.is_empty() {
        String::new()
    } else {
        format!("{}\n\n", escape_html(&truncate_chars(summary, max_chars)))
    }
}

fn ai_block(ai_summary: Option<&str>) -> String {
    match ai_summary {
        Some(summary) => format!("🤖 <b>AI Summary:</b>\n{}\n\n", escape_html(summary)),
        None => String::new(),
    }
}

pub fn article(index: usize, total: usize, article: &Article, ai_summary: Option<&str>) -> String {
    format!(
        "📰 <b>Article {}/{}</b>\n\n<b>{}</b>\n\n📅 {}\n\n{}{}{}",
        index,
        total,
        escape_html(&article.title),
        escape_html(&article.published_display()),
        summary_block(&article.summary, NEWS_SUMMARY_CHARS),
        ai_block(ai_summary),
        read_more(&article.link)
    )
}

pub fn search_usage() -> String {
    "Please provide a search keyword.\n\nExample: /search artificial intelligence".to_string()
}

pub fn searching(keyword: &str) -> String {
    format!("🔍 Searching for: <b>{}</b>...", escape_html(keyword))
}

pub fn no_search_results(keyword: &str) -> String {
    format!("❌ No articles found for '{}'", escape_html(keyword))
}

pub fn search_result(article: &Article, ai_summary: Option<&str>) -> String {
    format!(
        "📰 <b>{}</b>\n\n<b>{}</b>\n\n{}{}{}",
        escape_html(&article.source.to_uppercase()),
        escape_html(&article.title),
        summary_block(&article.summary, SEARCH_SUMMARY_CHARS),
        ai_block(ai_summary),
        read_more(&article.link)
    )
}

pub fn search_truncated(shown: usize, total: usize) -> String {
    format!(
        "📊 Showing {} of {} results\n\n🌟 Upgrade to Premium for 10 results per search!",
        shown, total
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article(summary: &str) -> Article {
        Article {
            title: "Rust & <friends>".to_string(),
            link: "https://example.com/a?x=1&y=2".to_string(),
            published: None,
            summary: summary.to_string(),
            source: "bbc".to_string(),
            category: "general".to_string(),
        }
    }

    #[test]
    fn article_text_is_escaped_and_truncated() {
        let text = article(1, 3, &sample_article(&"x".repeat(600)), None);
        assert!(text.contains("<b>Rust &amp; &lt;friends&gt;</b>"));
        assert!(text.contains(&format!("{}...", "x".repeat(500))));
        assert!(!text.contains(&"x".repeat(501)));
        assert!(text.contains("href=\"https://example.com/a?x=1&amp;y=2\""));
    }

    #[test]
    fn search_result_uses_shorter_summary() {
        let text = search_result(&sample_article(&"y".repeat(450)), Some("Short take."));
        assert!(text.starts_with("📰 <b>BBC</b>"));
        assert!(text.contains(&format!("{}...", "y".repeat(400))));
        assert!(text.contains("AI Summary:</b>\nShort take."));
    }

    #[test]
    fn sources_are_two_per_row() {
        let sources: Vec<String> = ["arstechnica", "bbc", "guardian"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let keyboard = source_keyboard(&sources, Tier::Free);
        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
        assert_eq!(keyboard.inline_keyboard[1].len(), 1);
        assert_eq!(
            keyboard.callback_data(),
            vec!["source_arstechnica", "source_bbc", "source_guardian", "show_premium"]
        );

        let premium = source_keyboard(&sources, Tier::Premium);
        assert_eq!(premium.inline_keyboard.len(), 2);
    }

    #[test]
    fn locked_categories_are_marked() {
        let categories: BTreeSet<String> = ["general", "technology", "world"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let keyboard = category_keyboard("bbc", &categories, Allowance::Only(&["general", "world"]));
        let labels: Vec<&str> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(labels, vec!["General", "🔒 Technology", "World", "⬅️ Back"]);
        assert_eq!(keyboard.callback_data()[1], "category_bbc_technology");
    }

    #[test]
    fn free_welcome_lists_plan() {
        assert!(welcome(Tier::Free).contains("Free Plan Includes"));
        assert!(!welcome(Tier::Premium).contains("Free Plan Includes"));
    }
}
