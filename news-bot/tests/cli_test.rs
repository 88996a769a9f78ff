mod common;

use std::io::Cursor;

use common::Harness;
use news_bot::{AdminCli, ReaderCli, Result, Tier};

const CLI_USER: &str = "cli";

async fn read(harness: &Harness, input: &str) -> Result<String> {
    let mut cli = ReaderCli::new(
        harness.services.clone(),
        CLI_USER,
        Cursor::new(input.to_string()),
        Vec::new(),
    );
    cli.run().await?;
    Ok(String::from_utf8(cli.into_output()).expect("utf-8 output"))
}

async fn admin(harness: &Harness, input: &str) -> Result<String> {
    let mut cli = AdminCli::new(
        harness.services.subscriptions.clone(),
        Cursor::new(input.to_string()),
        Vec::new(),
    );
    cli.run().await?;
    Ok(String::from_utf8(cli.into_output()).expect("utf-8 output"))
}

#[tokio::test]
async fn lists_sources_and_exits() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "1\n5\n").await?;

    assert!(out.contains("📰 Available News Sources:"));
    assert!(out.contains("BBC:\n  Categories: general, technology, world"));
    assert!(out.contains("TECHCRUNCH:"));
    assert!(out.trim_end().ends_with("👋 Goodbye!"));
    Ok(())
}

#[tokio::test]
async fn end_of_input_exits_cleanly() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "").await?;
    assert!(out.contains("Goodbye"));
    Ok(())
}

#[tokio::test]
async fn invalid_choice_is_reported() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "9\n5\n").await?;
    assert!(out.contains("❌ Invalid option. Please choose 1-5."));
    Ok(())
}

#[tokio::test]
async fn fetch_defaults_to_general_and_counts_usage() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "2\nbbc\n\n2\nn\n5\n").await?;

    assert!(out.contains("🔍 Fetching BBC - general news..."));
    assert!(out.contains("📰 Article 1/2"));
    assert!(out.contains("Title: AI chip race heats up"));
    assert!(out.contains("Link: https://news.test/bbc/2"));
    assert!(out.contains("Summary:\nChipmakers compete for data centre orders."));
    assert!(!out.contains("Article 3/"));
    assert_eq!(harness.subscriptions().get_usage(CLI_USER).await.daily_count, 2);
    Ok(())
}

#[tokio::test]
async fn unknown_category_error_is_shown_and_menu_continues() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "2\nbbc\nnope\n\n\n5\n").await?;

    assert!(out.contains(
        "❌ Error: Category 'nope' not available for bbc. Available categories: general, technology, world"
    ));
    assert!(out.contains("Goodbye"));
    assert_eq!(harness.subscriptions().get_usage(CLI_USER).await.daily_count, 0);
    Ok(())
}

#[tokio::test]
async fn keyword_search_in_one_source() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "3\nai\ntechcrunch\n\n\n").await?;

    assert!(out.contains("   Searching for keyword: 'ai'"));
    assert!(out.contains("✓ Found 4 article(s)"));
    assert!(out.contains("Title: OpenAI ships a new model"));
    Ok(())
}

#[tokio::test]
async fn keyword_search_without_hits_suggests_alternatives() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "3\nzeppelin\nbbc\nworld\n\n").await?;

    assert!(out.contains("❌ No articles found"));
    assert!(out.contains("Try a different keyword or check other categories"));
    Ok(())
}

#[tokio::test]
async fn search_everywhere_groups_by_source_and_reports_failures() -> Result<()> {
    let harness = Harness::new();
    let out = read(&harness, "4\nai\n\n").await?;

    assert!(out.contains("🔍 Searching all sources for: 'ai'..."));
    assert!(out.contains("✓ Found results in 4 source(s)"));
    assert!(out.contains("📰 BBC (2 articles)"));
    assert!(out.contains("• New AI rules agreed"));
    assert!(out.contains("📰 WIRED (1 articles)"));
    assert!(out.contains("⚠ Skipped reuters: HTTP 503"));
    assert_eq!(harness.subscriptions().get_usage(CLI_USER).await.daily_count, 6);
    Ok(())
}

#[tokio::test]
async fn daily_limit_blocks_reading() -> Result<()> {
    let harness = Harness::new();
    harness.use_articles(CLI_USER, 10).await;

    let out = read(&harness, "2\nbbc\ngeneral\n\n\n").await?;
    assert!(out.contains("❌ Daily limit reached (10 articles)"));
    assert!(!out.contains("Fetching"));
    Ok(())
}

#[tokio::test]
async fn remaining_allowance_caps_the_article_list() -> Result<()> {
    let harness = Harness::new();
    harness.use_articles(CLI_USER, 8).await;

    let out = read(&harness, "2\nbbc\ngeneral\n5\nn\n").await?;
    assert!(out.contains("📰 Article 1/2"));
    assert!(out.contains("📰 Article 2/2"));
    assert!(!out.contains("📰 Article 3/"));
    assert!(out.contains("Daily limit reached after 2 article(s); 3 more not shown"));
    assert_eq!(harness.subscriptions().get_usage(CLI_USER).await.daily_count, 10);
    Ok(())
}

#[tokio::test]
async fn ai_summaries_need_premium() -> Result<()> {
    let harness = Harness::with_summarizer();
    harness.serve_bbc_pages();

    let out = read(&harness, "2\nbbc\ngeneral\n1\ny\n").await?;
    assert!(out.contains("AI summaries are a Premium feature"));
    assert!(!out.contains("AI Summary:"));
    Ok(())
}

#[tokio::test]
async fn premium_reader_gets_ai_summaries() -> Result<()> {
    let harness = Harness::with_summarizer();
    harness.serve_bbc_pages();
    harness.subscriptions().upgrade(CLI_USER, 1).await?;

    let out = read(&harness, "2\nbbc\ngeneral\n1\ny\n").await?;
    assert!(out.contains("🤖 Generating AI summary..."));
    assert!(out.contains(
        "AI Summary:\nAI chip race heats up dominated the agenda this week as officials met in the capital."
    ));
    Ok(())
}

#[tokio::test]
async fn ai_summary_without_token_is_explained() -> Result<()> {
    let harness = Harness::new();
    harness.subscriptions().upgrade(CLI_USER, 1).await?;

    let out = read(&harness, "2\nbbc\ngeneral\n1\nyes\n").await?;
    assert!(out.contains("AI summaries are unavailable: HF_TOKEN is not configured"));
    Ok(())
}

#[tokio::test]
async fn admin_upgrades_after_confirmation() -> Result<()> {
    let harness = Harness::new();
    let out = admin(&harness, "1\n42\n2\ny\n5\n").await?;

    assert!(out.contains("✅ User 42 upgraded to Premium for 2 month(s)! (until July 04, 2025)"));
    assert_eq!(harness.subscriptions().get_tier("42").await, Tier::Premium);
    Ok(())
}

#[tokio::test]
async fn admin_upgrade_can_be_cancelled() -> Result<()> {
    let harness = Harness::new();
    let out = admin(&harness, "1\n42\n\nn\n5\n").await?;

    assert!(out.contains("Upgrade user 42 to Premium for 1 month(s)? (y/n)"));
    assert!(out.contains("❌ Cancelled"));
    assert_eq!(harness.subscriptions().get_tier("42").await, Tier::Free);
    Ok(())
}

#[tokio::test]
async fn admin_rejects_bad_input() -> Result<()> {
    let harness = Harness::new();
    let out = admin(&harness, "1\nabc\n1\n42\nmany\n1\n42\n0\ny\n5\n").await?;

    assert_eq!(out.matches("❌ Invalid input").count(), 2);
    assert!(out.contains("❌ Upgrade failed"));
    assert!(harness.subscriptions().record("42").await.is_none());
    Ok(())
}

#[tokio::test]
async fn admin_status_and_premium_listing() -> Result<()> {
    let harness = Harness::new();
    harness.use_articles("42", 3).await;

    let out = admin(&harness, "2\n42\n3\n").await?;
    assert!(out.contains("User ID: 42\nTier: FREE\nDaily Usage: 3/10"));
    assert!(out.contains("No premium users found"));

    harness.subscriptions().upgrade("42", 1).await?;
    let out = admin(&harness, "2\n42\n3\n").await?;
    assert!(out.contains("Tier: PREMIUM\nDaily Usage: 3/100\nExpires: 2025-06-04 09:00"));
    assert!(out.contains("Total premium users: 1"));
    Ok(())
}

#[tokio::test]
async fn admin_revoke_requires_a_known_user() -> Result<()> {
    let harness = Harness::new();
    harness.subscriptions().upgrade("42", 1).await?;

    let out = admin(&harness, "4\n99\n4\n42\ny\n").await?;
    assert!(out.contains("❌ User 99 not found in database"));
    assert!(out.contains("✅ Premium access removed for user 42"));
    assert_eq!(harness.subscriptions().get_tier("42").await, Tier::Free);
    Ok(())
}
