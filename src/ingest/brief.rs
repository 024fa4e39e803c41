// src/ingest/brief.rs
//! ETH brief collector: every section is fetched concurrently and fails on its own.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ingest::http::HttpFetcher;
use crate::ingest::providers::coinbase::CoinbaseQuotes;
use crate::ingest::providers::coingecko::CoinGeckoFeed;
use crate::ingest::providers::defillama::DefiLlamaClient;
use crate::ingest::soft;
use crate::ingest::types::{AssetQuote, BriefSnapshot, BriefSource, MajorPrices, SymbolQuote};

pub const TOP_PROTOCOLS: usize = 5;
pub const TOP_STABLECOINS: usize = 4;
pub const TOP_DEXES: usize = 5;

pub struct EthBriefCollector {
    coinbase: CoinbaseQuotes,
    coingecko: CoinGeckoFeed,
    llama: DefiLlamaClient,
}

impl EthBriefCollector {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self {
            coinbase: CoinbaseQuotes::new(http.clone()),
            coingecko: CoinGeckoFeed::new(http.clone(), Vec::new()),
            llama: DefiLlamaClient::new(http),
        }
    }
}

#[async_trait]
impl BriefSource for EthBriefCollector {
    async fn gather(&self) -> BriefSnapshot {
        let (eth, btc, caps, tvl, protocols, stablecoins, dex) = tokio::join!(
            self.coinbase.quote("ETH"),
            self.coinbase.quote("BTC"),
            self.coingecko.market_caps(&["ethereum", "bitcoin"]),
            self.llama.chain_tvl(),
            self.llama.top_protocols(TOP_PROTOCOLS),
            self.llama.top_stablecoins(TOP_STABLECOINS),
            self.llama.dex_volume(TOP_DEXES),
        );

        // Market caps are decoration: without them the price lines just omit the cap.
        let caps = soft("market_caps", caps).unwrap_or_default();
        let cap = |id: &str| caps.get(id).copied().unwrap_or(0.0);

        let prices = match (soft("eth_price", eth), soft("btc_price", btc)) {
            (Some(eth), Some(btc)) => Some(MajorPrices {
                eth: AssetQuote {
                    price: eth.price,
                    change_24h: eth.change_24h,
                    market_cap: cap("ethereum"),
                },
                btc: AssetQuote {
                    price: btc.price,
                    change_24h: btc.change_24h,
                    market_cap: cap("bitcoin"),
                },
            }),
            _ => None,
        };

        BriefSnapshot {
            prices,
            tvl: soft("chain_tvl", tvl),
            protocols: soft("protocols", protocols).unwrap_or_default(),
            stablecoins: soft("stablecoins", stablecoins).unwrap_or_default(),
            dex: soft("dex_volume", dex),
        }
    }
}
