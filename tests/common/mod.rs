// tests/common/mod.rs
//
// Scripted fakes for the dispatcher's collaborators. No network.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use digest_courier::dispatch::{DispatchConfig, Dispatcher, Sources};
use digest_courier::format::Markup;
use digest_courier::ingest::types::{
    Article, ArticleFeed, BriefSnapshot, BriefSource, ExchangeRates, KeywordSource, PriceTick,
    RateQuote, RateSource, SourceError, SourcePriceFeed, Story, StorySource,
};
use digest_courier::notify::{DeliveryError, Messenger};
use digest_courier::store::{KvStore, ListPage, ManualClock, MemoryStore, StoreError};

pub fn story(id: u64, score: i64) -> Story {
    Story {
        id,
        title: format!("Story number {id} about compilers"),
        url: format!("https://example.com/{id}"),
        score,
        by: "alice".into(),
        time: 1_700_000_000,
        descendants: 4,
    }
}

/// Ranked stories 1..=n, plus a call counter.
pub struct FakeStories {
    pub ranked: Vec<Story>,
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FakeStories {
    pub fn new(n: u64) -> Self {
        Self {
            ranked: (1..=n).map(|i| story(i, 100 + i as i64)).collect(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            ranked: Vec::new(),
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait]
impl StorySource for FakeStories {
    async fn top_stories(&self, limit: usize) -> Result<Vec<Story>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::Status(503));
        }
        Ok(self.ranked.iter().take(limit).cloned().collect())
    }

    async fn stories_in_range(&self, start: usize, end: usize) -> Result<Vec<Story>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SourceError::Status(503));
        }
        let start = start.max(1);
        Ok(self
            .ranked
            .iter()
            .skip(start - 1)
            .take(end.saturating_sub(start) + 1)
            .cloned()
            .collect())
    }
}

pub struct FakeArticles(pub Vec<Article>);

#[async_trait]
impl ArticleFeed for FakeArticles {
    async fn fetch(&self) -> Result<Vec<Article>, SourceError> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "fake-ars"
    }
}

pub struct FakePrices {
    pub result: Result<Vec<PriceTick>, SourceError>,
    pub calls: AtomicUsize,
}

impl FakePrices {
    pub fn ok(ticks: Vec<PriceTick>) -> Self {
        Self { result: Ok(ticks), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SourcePriceFeed for FakePrices {
    async fn fetch(&self) -> Result<Vec<PriceTick>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
    fn name(&self) -> &'static str {
        "fake-prices"
    }
}

pub struct FakeRates(pub Result<ExchangeRates, SourceError>);

impl FakeRates {
    pub fn php(value: f64) -> Self {
        Self(Ok(ExchangeRates {
            rates: vec![RateQuote { code: "PHP".into(), value }],
            updated_at: Some("2024-03-05 00:00 UTC".into()),
        }))
    }
}

#[async_trait]
impl RateSource for FakeRates {
    async fn fetch(&self) -> Result<ExchangeRates, SourceError> {
        self.0.clone()
    }
}

pub struct EmptyBrief;

#[async_trait]
impl BriefSource for EmptyBrief {
    async fn gather(&self) -> BriefSnapshot {
        BriefSnapshot::default()
    }
}

pub struct FixedKeywords;

#[async_trait]
impl KeywordSource for FixedKeywords {
    async fn keywords_for(&self, _url: &str, _title: &str, _count: usize) -> Vec<String> {
        vec!["compilers".into()]
    }
}

/// Records every send; optionally rejects them all.
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(String, String)>>,
    pub reject: bool,
}

impl RecordingMessenger {
    pub fn rejecting() -> Self {
        Self { sent: Mutex::new(Vec::new()), reject: true }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits for at least `n` sends (webhook dispatch runs in the background).
    pub async fn wait_for(&self, n: usize) -> Vec<(String, String)> {
        for _ in 0..200 {
            let msgs = self.messages();
            if msgs.len() >= n {
                return msgs;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.messages()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((chat_id.to_string(), text.to_string()));
        if self.reject {
            return Err(DeliveryError::Rejected {
                code: Some(400),
                description: "Bad Request: can't parse entities".into(),
            });
        }
        Ok(())
    }
}

/// Every operation fails.
pub struct BrokenStore;

#[async_trait]
impl KvStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }
    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }
    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }
    async fn list(&self, _prefix: &str, _cursor: Option<&str>, _limit: usize) -> Result<ListPage, StoreError> {
        Err(StoreError::Unavailable("down".into()))
    }
}

pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub stories: Arc<FakeStories>,
    pub prices: Arc<FakePrices>,
    pub messenger: Arc<RecordingMessenger>,
}

pub struct HarnessBuilder {
    pub stories: FakeStories,
    pub prices: FakePrices,
    pub rates: Option<FakeRates>,
    pub messenger: RecordingMessenger,
    pub top_n: usize,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            stories: FakeStories::new(30),
            prices: FakePrices::ok(vec![PriceTick { symbol: "BTC".into(), price: 67000.0, change_24h: 1.0 }]),
            rates: None,
            messenger: RecordingMessenger::default(),
            top_n: 3,
        }
    }
}

impl HarnessBuilder {
    pub fn build(self) -> Harness {
        let clock = Arc::new(ManualClock::starting_at(1_700_000_000_000));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let stories = Arc::new(self.stories);
        let prices = Arc::new(self.prices);
        let messenger = Arc::new(self.messenger);

        let sources = Sources {
            stories: stories.clone(),
            articles: Arc::new(FakeArticles(Vec::new())),
            prices: prices.clone(),
            rates: self.rates.map(|r| Arc::new(r) as Arc<dyn RateSource>),
            brief: Arc::new(EmptyBrief),
            keywords: Arc::new(FixedKeywords),
        };
        let mut config = DispatchConfig::new("-1001");
        config.markup = Markup::Markdown;
        config.top_n = self.top_n;

        let dispatcher = Arc::new(Dispatcher::new(store.clone(), sources, messenger.clone(), config));
        Harness { dispatcher, store, clock, stories, prices, messenger }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::default().build()
}

/// A Telegram-shaped update carrying one command entity at offset 0.
pub fn command_update(chat_id: i64, text: &str) -> serde_json::Value {
    let len = text.split_whitespace().next().unwrap_or("").encode_utf16().count();
    serde_json::json!({
        "update_id": 7,
        "message": {
            "chat": { "id": chat_id },
            "text": text,
            "entities": [{ "type": "bot_command", "offset": 0, "length": len }]
        }
    })
}

/// Sources with `stories` ranked stories and nothing else.
pub fn fake_sources(stories: u64) -> Sources {
    Sources {
        stories: Arc::new(FakeStories::new(stories)),
        articles: Arc::new(FakeArticles(Vec::new())),
        prices: Arc::new(FakePrices::ok(Vec::new())),
        rates: None,
        brief: Arc::new(EmptyBrief),
        keywords: Arc::new(FixedKeywords),
    }
}
