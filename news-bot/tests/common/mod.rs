#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use chrono::{Duration, NaiveDateTime};
use news_bot::subscription::{Clock, MemoryStore, SubscriptionManager};
use news_bot::{
    ArticleFetcher, ArticleScraper, ExtractiveSummarizer, FeedCatalog, MemoryTransport, NewsServices,
    Summarizer,
};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub const START: &str = "2025-05-05 09:00";

pub fn at(timestamp: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M").unwrap()
}

/// Clock the test moves by hand.
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

pub fn feed_url(source: &str, category: &str) -> String {
    format!("https://feeds.test/{}/{}", source, category)
}

pub fn page_url(source: &str, n: usize) -> String {
    format!("https://news.test/{}/{}", source, n)
}

/// RSS 2.0 document with one item per (title, description) pair. Links are
/// `page_url(source, index)`.
pub fn rss(source: &str, items: &[(&str, &str)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>{} test feed</title><link>https://news.test/</link><description>Headlines</description>"#,
        source
    );
    for (i, (title, description)) in items.iter().enumerate() {
        xml.push_str(&format!(
            "<item><title>{}</title><link>{}</link><description>{}</description>\
             <pubDate>Mon, 05 May 2025 0{}:00:00 GMT</pubDate></item>\n",
            title,
            page_url(source, i + 1),
            description,
            i % 10
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

pub const BBC_GENERAL: &[(&str, &str)] = &[
    ("AI chip race heats up", "Chipmakers compete for data centre orders."),
    ("Markets rally on rate hopes", "Shares rose across Europe."),
    ("New AI rules agreed", "Lawmakers settle on a framework."),
    ("Cup final preview", "Both teams are at full strength."),
    ("Storm warning issued", "Strong winds expected overnight."),
    ("Election count continues", "Results are due by morning."),
];

pub const TECHCRUNCH_GENERAL: &[(&str, &str)] = &[
    ("OpenAI ships a new model", "The release targets developers."),
    ("Robotics startup raises seed round", "Investors back warehouse automation."),
    ("Ai2 publishes open dataset", "Researchers can download it today."),
    ("Phone makers cut prices", "Mid-range devices get cheaper."),
    ("Chip tariffs and AI demand", "Supply chains shift again."),
];

/// Catalog and canned feeds: bbc, guardian, techcrunch and wired answer;
/// reuters' feed is down.
pub fn test_catalog() -> FeedCatalog {
    let mut catalog = FeedCatalog::empty();
    for (source, category) in [
        ("bbc", "general"),
        ("bbc", "world"),
        ("bbc", "technology"),
        ("guardian", "general"),
        ("guardian", "world"),
        ("techcrunch", "general"),
        ("wired", "general"),
        ("reuters", "general"),
    ] {
        catalog.insert(source, category, &feed_url(source, category));
    }
    catalog
}

pub fn test_transport() -> MemoryTransport {
    MemoryTransport::new()
        .with_body(&feed_url("bbc", "general"), rss("bbc", BBC_GENERAL))
        .with_body(
            &feed_url("bbc", "world"),
            rss("bbc", &[("Summit ends", "Leaders sign a joint statement.")]),
        )
        .with_body(
            &feed_url("bbc", "technology"),
            rss("bbc", &[("Quantum leap", "A lab demo impresses.")]),
        )
        .with_body(
            &feed_url("guardian", "general"),
            rss(
                "guardian",
                &[
                    ("Housing plan unveiled", "Councils get new powers."),
                    ("Schools trial AI tutors", "Pupils report mixed results."),
                ],
            ),
        )
        .with_body(
            &feed_url("guardian", "world"),
            rss("guardian", &[("Ceasefire holds", "Aid convoys move in.")]),
        )
        .with_body(&feed_url("techcrunch", "general"), rss("techcrunch", TECHCRUNCH_GENERAL))
        .with_body(
            &feed_url("wired", "general"),
            rss("wired", &[("The AI gadget nobody asked for", "A review.")]),
        )
        .with_status(&feed_url("reuters", "general"), 503)
}

/// Long article page: three paragraphs, well over the summary threshold.
pub fn article_page(topic: &str) -> String {
    format!(
        "<html><body><h1>{topic}</h1>\
         <p>{topic} dominated the agenda this week as officials met in the capital.</p>\
         <p>Analysts said the outcome would shape policy for years to come.</p>\
         <p>Further talks are planned for next month, according to people familiar with the matter.</p>\
         </body></html>"
    )
}

pub struct Harness {
    pub services: NewsServices,
    pub transport: Arc<MemoryTransport>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_summarizer() -> Self {
        let summarizer: Arc<dyn Summarizer> = Arc::new(ExtractiveSummarizer::new(1));
        Self::build(Some(summarizer))
    }

    fn build(summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        init_tracing();
        let transport = Arc::new(test_transport());
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(at(START)));

        let subscriptions = Arc::new(SubscriptionManager::with_clock(store.clone(), clock.clone()));
        let services = NewsServices::new(
            Arc::new(ArticleFetcher::new(test_catalog(), transport.clone())),
            subscriptions,
            Arc::new(ArticleScraper::new(transport.clone(), true)),
            summarizer,
        );

        Self {
            services,
            transport,
            store,
            clock,
        }
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.services.subscriptions
    }

    /// Serve a long page for every bbc general article.
    pub fn serve_bbc_pages(&self) {
        for (i, (title, _)) in BBC_GENERAL.iter().enumerate() {
            self.transport
                .insert(&page_url("bbc", i + 1), news_bot::TextResponse::ok(article_page(title)));
        }
    }

    pub async fn use_articles(&self, user_id: &str, count: u32) {
        for _ in 0..count {
            self.subscriptions().increment_usage(user_id).await.unwrap();
        }
    }
}
