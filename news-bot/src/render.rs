//! Plain-text rendering for the terminal front ends.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::articles::SearchReport;
use crate::subscription::{LimitsSnapshot, SubscriptionRecord};
use crate::text::truncate_chars;
use crate::types::Article;

const RULE: &str = "======================================================================";

/// Summary length shown per article in cross-source results.
pub const SEARCH_SUMMARY_CHARS: usize = 200;

pub fn date_long(at: NaiveDateTime) -> String {
    at.format("%B %d, %Y").to_string()
}

pub fn timestamp(at: Option<NaiveDateTime>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn sources_listing(sources: &BTreeMap<String, BTreeSet<String>>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n📰 Available News Sources:");
    let _ = writeln!(out, "{}", &RULE[..60]);
    for (source, categories) in sources {
        let categories: Vec<&str> = categories.iter().map(String::as_str).collect();
        let _ = writeln!(out, "\n{}:", source.to_uppercase());
        let _ = writeln!(out, "  Categories: {}", categories.join(", "));
    }
    let _ = writeln!(out, "{}", &RULE[..60]);
    out
}

pub fn article_block(index: usize, total: usize, article: &Article) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "📰 Article {}/{}", index, total);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Title: {}", article.title);
    let _ = writeln!(out, "Published: {}", article.published_display());
    let _ = writeln!(out, "Link: {}", article.link);
    let _ = writeln!(out);
    if !article.summary.is_empty() {
        let _ = writeln!(out, "Summary:");
        let _ = writeln!(out, "{}", article.summary);
        let _ = writeln!(out);
    }
    out
}

pub fn search_source_block(source: &str, articles: &[Article]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "📰 {} ({} articles)", source.to_uppercase(), articles.len());
    let _ = writeln!(out, "{}", RULE);
    for article in articles {
        let _ = writeln!(out, "\n• {}", article.title);
        let _ = writeln!(out, "  🔗 {}", article.link);
        if !article.summary.is_empty() {
            let _ = writeln!(out, "  {}", truncate_chars(&article.summary, SEARCH_SUMMARY_CHARS));
        }
    }
    out
}

pub fn search_failures(report: &SearchReport) -> String {
    let mut out = String::new();
    for (source, err) in &report.failures {
        let _ = writeln!(out, "⚠ Skipped {}: {}", source, err);
    }
    out
}

pub fn user_status(user_id: &str, snapshot: &LimitsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", &RULE[..60]);
    let _ = writeln!(out, "User ID: {}", user_id);
    let _ = writeln!(out, "Tier: {}", snapshot.tier.as_str().to_uppercase());
    let _ = writeln!(
        out,
        "Daily Usage: {}/{}",
        snapshot.current_usage, snapshot.limits.daily_articles
    );
    if snapshot.tier.is_premium() {
        let _ = writeln!(out, "Expires: {}", timestamp(snapshot.expires_at));
    }
    let _ = writeln!(out, "{}", &RULE[..60]);
    out
}

pub fn premium_users(users: &[(String, SubscriptionRecord)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", &RULE[..60]);
    let _ = writeln!(out, "Premium Users:");
    let _ = writeln!(out, "{}", &RULE[..60]);
    if users.is_empty() {
        let _ = writeln!(out, "No premium users found");
    } else {
        for (user_id, record) in users {
            let _ = writeln!(out, "User ID: {}", user_id);
            let _ = writeln!(out, "  Expires: {}", timestamp(record.expires_at));
            let _ = writeln!(out, "  Upgraded: {}", timestamp(record.upgraded_at));
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "Total premium users: {}", users.len());
    }
    let _ = writeln!(out, "{}", &RULE[..60]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::Tier;

    #[test]
    fn listing_is_sorted_and_uppercased() {
        let mut sources = BTreeMap::new();
        sources.insert("guardian".to_string(), BTreeSet::from(["world".to_string()]));
        sources.insert("bbc".to_string(), BTreeSet::from(["world".to_string(), "general".to_string()]));
        let text = sources_listing(&sources);
        let bbc = text.find("BBC:").unwrap();
        let guardian = text.find("GUARDIAN:").unwrap();
        assert!(bbc < guardian);
        assert!(text.contains("Categories: general, world"));
    }

    #[test]
    fn premium_status_shows_expiry() {
        let expiry = NaiveDateTime::parse_from_str("2025-07-04 08:30", "%Y-%m-%d %H:%M").unwrap();
        let snapshot = LimitsSnapshot {
            tier: Tier::Premium,
            limits: Tier::Premium.limits(),
            current_usage: 4,
            expires_at: Some(expiry),
        };
        let text = user_status("42", &snapshot);
        assert!(text.contains("Tier: PREMIUM"));
        assert!(text.contains("Daily Usage: 4/100"));
        assert!(text.contains("Expires: 2025-07-04 08:30"));
        assert_eq!(date_long(expiry), "July 04, 2025");
    }
}
