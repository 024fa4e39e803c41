// src/ingest/providers/coingecko.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{PriceTick, SourceError, SourcePriceFeed};

pub const COINGECKO_SIMPLE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Ticker symbol -> CoinGecko coin id.
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    Some(match symbol.to_ascii_uppercase().as_str() {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "BNB" => "binancecoin",
        "SOL" => "solana",
        "TON" => "the-open-network",
        "TRX" => "tron",
        "DOT" => "polkadot",
        "LINK" => "chainlink",
        "AVAX" => "avalanche-2",
        "XRP" => "ripple",
        "DOGE" => "dogecoin",
        "ADA" => "cardano",
        _ => return None,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct SimplePrice {
    #[serde(default)]
    pub usd: f64,
    #[serde(default)]
    pub usd_24h_change: Option<f64>,
    #[serde(default)]
    pub usd_market_cap: Option<f64>,
}

/// One batched request for every symbol.
pub struct CoinGeckoFeed {
    http: Arc<HttpFetcher>,
    url: String,
    symbols: Vec<String>,
}

impl CoinGeckoFeed {
    pub fn new(http: Arc<HttpFetcher>, symbols: Vec<String>) -> Self {
        Self {
            http,
            url: COINGECKO_SIMPLE_URL.to_string(),
            symbols,
        }
    }

    pub async fn simple_prices(&self, ids: &[&str]) -> Result<HashMap<String, SimplePrice>, SourceError> {
        let url = format!(
            "{}?ids={}&vs_currencies=usd&include_24hr_change=true&include_market_cap=true",
            self.url,
            ids.join(",")
        );
        self.http
            .get_json(&url, &[("Accept", "application/json")])
            .await
    }

    /// Market caps in USD keyed by coin id; missing ids map to 0.
    pub async fn market_caps(&self, ids: &[&str]) -> Result<HashMap<String, f64>, SourceError> {
        let prices = self.simple_prices(ids).await?;
        Ok(prices
            .into_iter()
            .map(|(id, p)| (id, p.usd_market_cap.unwrap_or(0.0)))
            .collect())
    }
}

fn to_ticks(symbols: &[String], prices: &HashMap<String, SimplePrice>) -> Vec<PriceTick> {
    symbols
        .iter()
        .filter_map(|s| {
            let p = prices.get(coin_id(s)?)?;
            Some(PriceTick {
                symbol: s.to_ascii_uppercase(),
                price: p.usd,
                change_24h: p.usd_24h_change.unwrap_or(0.0),
            })
        })
        .collect()
}

#[async_trait]
impl SourcePriceFeed for CoinGeckoFeed {
    async fn fetch(&self) -> Result<Vec<PriceTick>, SourceError> {
        let ids: Vec<&str> = self.symbols.iter().filter_map(|s| coin_id(s)).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let prices = self.simple_prices(&ids).await?;
        Ok(to_ticks(&self.symbols, &prices))
    }

    fn name(&self) -> &'static str {
        "coingecko"
    }
}
