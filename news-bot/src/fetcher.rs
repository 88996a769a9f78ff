use crate::types::{FetchConfig, NewsError, Result, TextResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Plain HTTP GET used by the feed fetcher and the article scraper.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and return its status and body. Non-success statuses are
    /// returned, not raised; transport failures are errors.
    async fn get(&self, url: &str) -> Result<TextResponse>;
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| NewsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for Fetcher {
    async fn get(&self, url: &str) -> Result<TextResponse> {
        let start_time = Instant::now();
        debug!("Fetching: {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsError::request(url, e))?;
        let status = response.status().as_u16();

        let mut body = BodyBuffer::new(self.config.max_feed_size_mb);
        // advertised length first, then the running total for chunked or compressed bodies
        if let Some(content_length) = response.content_length() {
            body.check(content_length as usize)?;
        }
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NewsError::request(url, e))?
        {
            body.push(&chunk)?;
        }
        let body = body.into_text();

        info!(
            "Fetched {} (HTTP {}, {} bytes, {} ms)",
            url,
            status,
            body.len(),
            start_time.elapsed().as_millis()
        );
        Ok(TextResponse { status, body })
    }
}

/// Response body collected chunk by chunk under a size cap.
struct BodyBuffer {
    bytes: Vec<u8>,
    max_bytes: usize,
}

impl BodyBuffer {
    fn new(max_feed_size_mb: usize) -> Self {
        Self {
            bytes: Vec::new(),
            max_bytes: max_feed_size_mb.saturating_mul(1024 * 1024),
        }
    }

    fn check(&self, total: usize) -> Result<()> {
        if total > self.max_bytes {
            return Err(NewsError::FeedTooLarge {
                size_mb: total / (1024 * 1024),
            });
        }
        Ok(())
    }

    fn push(&mut self, chunk: &[u8]) -> Result<()> {
        self.check(self.bytes.len() + chunk.len())?;
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    fn into_text(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Transport serving canned responses from memory. Unknown URLs answer 404.
#[derive(Default)]
pub struct MemoryTransport {
    responses: RwLock<HashMap<String, TextResponse>>,
    requests: RwLock<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, url: &str, body: impl Into<String>) -> Self {
        self.insert(url, TextResponse::ok(body));
        self
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.insert(
            url,
            TextResponse {
                status,
                body: String::new(),
            },
        );
        self
    }

    pub fn insert(&self, url: &str, response: TextResponse) {
        if let Ok(mut responses) = self.responses.write() {
            responses.insert(url.to_string(), response);
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, url: &str) -> Result<TextResponse> {
        if let Ok(mut requests) = self.requests.write() {
            requests.push(url.to_string());
        }
        let response = self
            .responses
            .read()
            .ok()
            .and_then(|responses| responses.get(url).cloned());
        Ok(response.unwrap_or(TextResponse {
            status: 404,
            body: String::new(),
        }))
    }
}
