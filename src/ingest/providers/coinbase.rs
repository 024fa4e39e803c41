// src/ingest/providers/coinbase.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{PriceTick, SourceError, SymbolQuote};

pub const COINBASE_PRODUCTS_URL: &str = "https://api.exchange.coinbase.com/products";

#[derive(Debug, Deserialize)]
struct ProductStats {
    open: String,
    last: String,
}

/// 24h change is derived from the day's open, 0 when open is unusable.
fn to_tick(symbol: &str, s: &ProductStats) -> Result<PriceTick, SourceError> {
    let last: f64 = s
        .last
        .trim()
        .parse()
        .map_err(|_| SourceError::Payload(format!("coinbase last: {:?}", s.last)))?;
    let open: f64 = s.open.trim().parse().unwrap_or(0.0);
    let change_24h = if open > 0.0 {
        (last - open) / open * 100.0
    } else {
        0.0
    };
    Ok(PriceTick {
        symbol: symbol.to_string(),
        price: last,
        change_24h,
    })
}

/// Quotes `<SYMBOL>-USD` product stats.
pub struct CoinbaseQuotes {
    http: Arc<HttpFetcher>,
    base: String,
}

impl CoinbaseQuotes {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self {
            http,
            base: COINBASE_PRODUCTS_URL.to_string(),
        }
    }
}

#[async_trait]
impl SymbolQuote for CoinbaseQuotes {
    async fn quote(&self, symbol: &str) -> Result<PriceTick, SourceError> {
        let url = format!("{}/{}-USD/stats", self.base, symbol.to_ascii_uppercase());
        let stats: ProductStats = self.http.get_json(&url, &[]).await?;
        to_tick(symbol, &stats)
    }

    fn name(&self) -> &'static str {
        "coinbase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_from_open() {
        let s = ProductStats {
            open: "100".into(),
            last: "110".into(),
        };
        let t = to_tick("ETH", &s).unwrap();
        assert!((t.change_24h - 10.0).abs() < 1e-9);
        assert!((t.price - 110.0).abs() < 1e-9);
    }

    #[test]
    fn zero_open_means_no_change() {
        let s = ProductStats {
            open: "0".into(),
            last: "5".into(),
        };
        assert_eq!(to_tick("X", &s).unwrap().change_24h, 0.0);
    }
}
