// src/lib.rs
// Public library surface for the service binary and integration tests.

pub mod api;
pub mod cache;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod format;
pub mod ingest;
pub mod keywords;
pub mod ledger;
pub mod metrics;
pub mod notify;
pub mod scheduler;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

pub use crate::api::{create_router, AppState};
pub use crate::dispatch::{DigestReport, DispatchConfig, Dispatcher, Sources};

use crate::config::{PriceFeedKind, Settings};
use crate::ingest::brief::EthBriefCollector;
use crate::ingest::http::HttpFetcher;
use crate::ingest::providers::{
    ars_rss::ArsRssFeed, binance::BinanceQuotes, coinbase::CoinbaseQuotes,
    coingecko::CoinGeckoFeed, currency_api::CurrencyApiClient, hn::HackerNewsClient,
    per_symbol::{default_symbols, PerSymbolFeed},
};
use crate::ingest::retry::RetryPolicy;
use crate::ingest::types::{RateSource, SourcePriceFeed};
use crate::keywords::ArticleKeywords;
use crate::notify::TelegramClient;
use crate::store::{FileStore, KvStore, MemoryStore, SystemClock};

/// Live providers for the given settings.
pub fn live_sources(settings: &Settings) -> anyhow::Result<Sources> {
    let http = Arc::new(HttpFetcher::new(settings.http_timeout, RetryPolicy::default())?);
    // article pages live on arbitrary hosts; one attempt each
    let pages = Arc::new(HttpFetcher::new(settings.http_timeout, RetryPolicy::none())?);

    let symbols = if settings.price_symbols.is_empty() {
        default_symbols()
    } else {
        settings.price_symbols.clone()
    };
    let prices: Arc<dyn SourcePriceFeed> = match settings.price_feed {
        PriceFeedKind::Binance => Arc::new(PerSymbolFeed::new(BinanceQuotes::new(http.clone()), symbols)),
        PriceFeedKind::Coinbase => Arc::new(PerSymbolFeed::new(CoinbaseQuotes::new(http.clone()), symbols)),
        PriceFeedKind::CoinGecko => Arc::new(CoinGeckoFeed::new(http.clone(), symbols)),
    };
    let rates = settings
        .currency_api_key
        .as_ref()
        .map(|key| Arc::new(CurrencyApiClient::new(http.clone(), key.clone())) as Arc<dyn RateSource>);

    info!(
        price_feed = prices.name(),
        rates = rates.is_some(),
        timeout_ms = settings.http_timeout.as_millis() as u64,
        "sources wired"
    );

    Ok(Sources {
        stories: Arc::new(HackerNewsClient::new(http.clone())),
        articles: Arc::new(ArsRssFeed::live(http.clone())),
        prices,
        rates,
        brief: Arc::new(EthBriefCollector::new(http)),
        keywords: Arc::new(ArticleKeywords::new(pages)),
    })
}

/// File-backed store when a path is configured, in-process otherwise.
pub async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn KvStore>> {
    match &settings.store_path {
        Some(path) => {
            let store = FileStore::open(path.clone(), Arc::new(SystemClock))
                .await
                .with_context(|| format!("opening store at {}", path.display()))?;
            Ok(Arc::new(store))
        }
        None => {
            info!("using in-process store; ledger and cache reset on restart");
            Ok(Arc::new(MemoryStore::with_system_clock()))
        }
    }
}

/// Dispatcher over live providers and the bot API.
pub fn build_dispatcher(settings: &Settings, store: Arc<dyn KvStore>) -> anyhow::Result<Arc<Dispatcher>> {
    let messenger = TelegramClient::new(settings.bot_token.clone(), settings.markup)?
        .with_base(settings.api_base.clone());
    let config = DispatchConfig {
        markup: settings.markup,
        digest_chat_id: settings.chat_id.clone(),
        top_n: settings.hn_top_n,
        keyword_count: keywords::DEFAULT_KEYWORD_COUNT,
    };
    Ok(Arc::new(Dispatcher::new(
        store,
        live_sources(settings)?,
        Arc::new(messenger),
        config,
    )))
}
