// src/ingest/providers/per_symbol.rs
use async_trait::async_trait;

use crate::ingest::fan_out;
use crate::ingest::types::{PriceTick, SourceError, SourcePriceFeed, SymbolQuote};

pub const DEFAULT_SYMBOLS: [&str; 9] = ["BTC", "ETH", "BNB", "SOL", "TON", "TRX", "DOT", "LINK", "AVAX"];

pub fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

/// Adapts a one-symbol-per-request provider into a [`SourcePriceFeed`] by
/// quoting every symbol concurrently. Failed symbols are dropped; the feed
/// only errors when nothing at all could be quoted.
pub struct PerSymbolFeed<Q> {
    quote: Q,
    symbols: Vec<String>,
}

impl<Q: SymbolQuote> PerSymbolFeed<Q> {
    pub fn new(quote: Q, symbols: Vec<String>) -> Self {
        Self { quote, symbols }
    }
}

#[async_trait]
impl<Q: SymbolQuote> SourcePriceFeed for PerSymbolFeed<Q> {
    async fn fetch(&self) -> Result<Vec<PriceTick>, SourceError> {
        let ticks = fan_out(
            self.quote.name(),
            self.symbols.iter().map(|s| self.quote.quote(s)),
        )
        .await;
        if ticks.is_empty() && !self.symbols.is_empty() {
            return Err(SourceError::Payload(format!(
                "{}: no symbol could be quoted",
                self.quote.name()
            )));
        }
        Ok(ticks)
    }

    fn name(&self) -> &'static str {
        self.quote.name()
    }
}
