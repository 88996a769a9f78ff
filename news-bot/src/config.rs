//! Runtime configuration read from the environment.

use std::path::PathBuf;

use crate::summarizer::DEFAULT_MODEL;
use crate::types::{FetchConfig, NewsError, Result};

pub const DEFAULT_SUBSCRIPTIONS_PATH: &str = "data/subscriptions.json";
pub const DEFAULT_PAYMENT_LINK: &str = "https://buymeacoffee.com/mrlunatic";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_token: Option<String>,
    pub hf_token: Option<String>,
    pub hf_model: String,
    pub subscriptions_path: PathBuf,
    pub log_level: String,
    pub timeout_seconds: u64,
    pub payment_link: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            hf_token: None,
            hf_model: DEFAULT_MODEL.to_string(),
            subscriptions_path: PathBuf::from(DEFAULT_SUBSCRIPTIONS_PATH),
            log_level: "info".to_string(),
            timeout_seconds: FetchConfig::default().timeout_seconds,
            payment_link: DEFAULT_PAYMENT_LINK.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let timeout_seconds = match get("NEWS_BOT_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|t| *t > 0).ok_or_else(|| {
                NewsError::Config(format!("NEWS_BOT_TIMEOUT_SECS must be a positive integer, got '{}'", raw))
            })?,
            None => defaults.timeout_seconds,
        };

        Ok(Self {
            telegram_token: get("TELEGRAM_BOT_TOKEN"),
            hf_token: get("HF_TOKEN"),
            hf_model: get("HF_MODEL").unwrap_or(defaults.hf_model),
            subscriptions_path: get("SUBSCRIPTIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.subscriptions_path),
            log_level: get("NEWS_BOT_LOG").unwrap_or(defaults.log_level),
            timeout_seconds,
            payment_link: get("PAYMENT_LINK").unwrap_or(defaults.payment_link),
        })
    }

    pub fn require_telegram_token(&self) -> Result<&str> {
        self.telegram_token
            .as_deref()
            .ok_or_else(|| NewsError::Config("TELEGRAM_BOT_TOKEN not found in environment variables".to_string()))
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout_seconds: self.timeout_seconds,
            ..FetchConfig::default()
        }
    }
}
