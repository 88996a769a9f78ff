pub mod admin;
pub mod articles;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod logging;
pub mod parser;
pub mod render;
pub mod robots;
pub mod scrape;
pub mod services;
pub mod subscription;
pub mod summarizer;
pub mod telegram;
pub mod text;
pub mod types;

pub use admin::AdminCli;
pub use articles::{ArticleFetcher, SearchReport};
pub use catalog::FeedCatalog;
pub use cli::ReaderCli;
pub use config::AppConfig;
pub use fetcher::{Fetcher, MemoryTransport, Transport};
pub use parser::FeedParser;
pub use scrape::ArticleScraper;
pub use services::{AiSummary, NewsServices};
pub use subscription::{Feature, FeatureDecision, SubscriptionManager, Tier};
pub use summarizer::{ExtractiveSummarizer, HuggingFaceSummarizer, Summarizer};
pub use types::*;
