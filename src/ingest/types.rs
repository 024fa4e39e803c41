// src/ingest/types.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Expected upstream failures. These are values, not panics: callers decide
/// whether a failure degrades to an empty result or propagates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream request timed out")]
    Timeout,
    #[error("malformed upstream payload: {0}")]
    Payload(String),
}

/// A ranked Hacker News story as returned by the item API (already filtered
/// to stories that have a url, a title and a positive score).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub score: i64,
    pub by: String,
    pub time: i64,
    pub descendants: u32,
}

/// A story ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedStory {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub score: i64,
    pub author: String,
    pub time: i64,
    pub comment_count: u32,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ProcessedStory {
    pub fn from_story(story: Story, keywords: Vec<String>) -> Self {
        Self {
            id: story.id,
            title: story.title,
            url: story.url,
            score: story.score,
            author: story.by,
            time: story.time,
            comment_count: story.descendants,
            keywords,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub published_at: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
    /// Percent change over the last 24 hours.
    pub change_24h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateQuote {
    pub code: String,
    pub value: f64,
}

/// USD-based exchange rates in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRates {
    pub rates: Vec<RateQuote>,
    /// `YYYY-MM-DD HH:MM UTC`
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AssetQuote {
    pub price: f64,
    pub change_24h: f64,
    pub market_cap: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MajorPrices {
    pub eth: AssetQuote,
    pub btc: AssetQuote,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChainTvl {
    pub ethereum: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtocolTvl {
    pub name: String,
    pub tvl: f64,
    pub change_1d: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StablecoinSupply {
    pub symbol: String,
    pub circulating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DexVenue {
    pub name: String,
    pub volume_24h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DexVolume {
    pub total_24h: f64,
    pub total_7d: f64,
    pub top: Vec<DexVenue>,
}

/// Everything the ETH brief shows. Each section is independent: a failed
/// branch leaves `None` / an empty list and the brief renders a failure line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BriefSnapshot {
    pub prices: Option<MajorPrices>,
    pub tvl: Option<ChainTvl>,
    pub protocols: Vec<ProtocolTvl>,
    pub stablecoins: Vec<StablecoinSupply>,
    pub dex: Option<DexVolume>,
}

#[async_trait]
pub trait StorySource: Send + Sync {
    /// Top `limit` stories in ranking order.
    async fn top_stories(&self, limit: usize) -> Result<Vec<Story>, SourceError>;
    /// Stories ranked `start..=end` (1-based).
    async fn stories_in_range(&self, start: usize, end: usize) -> Result<Vec<Story>, SourceError>;
}

#[async_trait]
pub trait ArticleFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Article>, SourceError>;
    fn name(&self) -> &'static str;
}

/// Interchangeable price providers; one is chosen at deployment time.
#[async_trait]
pub trait SourcePriceFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<PriceTick>, SourceError>;
    fn name(&self) -> &'static str;
}

/// A provider that quotes one symbol per request.
#[async_trait]
pub trait SymbolQuote: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<PriceTick, SourceError>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<ExchangeRates, SourceError>;
}

#[async_trait]
pub trait BriefSource: Send + Sync {
    /// Never fails as a whole; see [`BriefSnapshot`].
    async fn gather(&self) -> BriefSnapshot;
}

#[async_trait]
pub trait KeywordSource: Send + Sync {
    /// Up to `count` topical tags for a story. Failures degrade to fewer tags.
    async fn keywords_for(&self, url: &str, title: &str, count: usize) -> Vec<String>;
}
