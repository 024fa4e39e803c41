// src/ingest/providers/binance.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{PriceTick, SourceError, SymbolQuote};

pub const BINANCE_TICKER_URL: &str = "https://api.binance.com/api/v3/ticker/24hr";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    last_price: String,
    price_change_percent: String,
}

fn parse_num(field: &str, raw: &str) -> Result<f64, SourceError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| SourceError::Payload(format!("binance {field}: {raw:?}")))
}

fn to_tick(symbol: &str, t: Ticker24h) -> Result<PriceTick, SourceError> {
    Ok(PriceTick {
        symbol: symbol.to_string(),
        price: parse_num("lastPrice", &t.last_price)?,
        change_24h: parse_num("priceChangePercent", &t.price_change_percent)?,
    })
}

/// Quotes `<SYMBOL>USDT` from the public 24h ticker.
pub struct BinanceQuotes {
    http: Arc<HttpFetcher>,
    url: String,
}

impl BinanceQuotes {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self {
            http,
            url: BINANCE_TICKER_URL.to_string(),
        }
    }
}

#[async_trait]
impl SymbolQuote for BinanceQuotes {
    async fn quote(&self, symbol: &str) -> Result<PriceTick, SourceError> {
        let url = format!("{}?symbol={}USDT", self.url, symbol.to_ascii_uppercase());
        let t: Ticker24h = self.http.get_json(&url, &[]).await?;
        to_tick(symbol, t)
    }

    fn name(&self) -> &'static str {
        "binance"
    }
}
