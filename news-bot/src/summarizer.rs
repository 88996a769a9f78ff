use crate::text::{char_prefix, extract_sentences};
use crate::types::{NewsError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Longest input, in characters, sent to a summarization model.
pub const MAX_INPUT_CHARS: usize = 10_000;

pub const DEFAULT_MODEL: &str = "Falconsai/text_summarization";

pub const DEFAULT_ENDPOINT: &str = "https://router.huggingface.co/hf-inference/models";

/// Trait for adapters that condense article text
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Get the name of this adapter
    fn adapter_name(&self) -> String;

    /// Summarize `text`. Empty input is an error.
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Summarizer backed by the Hugging Face inference API.
pub struct HuggingFaceSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HuggingFaceSummarizer {
    pub fn new(api_key: String, model: String, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| NewsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model,
            api_key,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    fn model_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model)
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    fn adapter_name(&self) -> String {
        format!("Hugging Face ({})", self.model)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let input = prepare_input(text)?;
        let url = self.model_url();
        debug!("Summarizing {} chars with {}", input.chars().count(), self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "inputs": input }))
            .send()
            .await
            .map_err(|e| NewsError::Summarization(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::Summarization(format!(
                "HTTP {}: {}",
                status,
                char_prefix(&body, 200)
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| NewsError::Summarization(format!("unreadable response: {}", e)))?;

        let summary = extract_summary(&value).ok_or_else(|| {
            NewsError::Summarization(format!("Unexpected response format: {}", char_prefix(&value.to_string(), 200)))
        })?;

        info!("Generated summary ({} chars) with {}", summary.len(), self.model);
        Ok(summary)
    }
}

/// Reject empty text and cut the rest to [`MAX_INPUT_CHARS`].
pub fn prepare_input(text: &str) -> Result<&str> {
    if text.trim().is_empty() {
        return Err(NewsError::Summarization("Article content is empty".to_string()));
    }
    Ok(char_prefix(text, MAX_INPUT_CHARS))
}

/// Pull the summary out of the response shapes the inference API uses:
/// `[{"summary_text": ..}]`, `{"summary_text": ..}`, `[".."]` or `".."`.
pub fn extract_summary(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("summary_text")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => match items.first()? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("summary_text")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        },
        _ => None,
    }
}

/// Offline summarizer that keeps the leading sentences.
pub struct ExtractiveSummarizer {
    max_sentences: usize,
}

impl ExtractiveSummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn adapter_name(&self) -> String {
        format!("Extractive ({} sentences)", self.max_sentences)
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let input = prepare_input(text)?;
        Ok(extract_sentences(input, self.max_sentences))
    }
}
