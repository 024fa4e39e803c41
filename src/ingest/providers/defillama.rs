// src/ingest/providers/defillama.rs
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{
    ChainTvl, DexVenue, DexVolume, ProtocolTvl, SourceError, StablecoinSupply,
};

pub const DEFILLAMA_API: &str = "https://api.llama.fi";
pub const STABLECOINS_API: &str = "https://stablecoins.llama.fi";
const CHAIN: &str = "Ethereum";

#[derive(Debug, Deserialize)]
pub struct LlamaChain {
    pub name: String,
    #[serde(default)]
    pub tvl: f64,
}

#[derive(Debug, Deserialize)]
pub struct LlamaProtocol {
    pub name: String,
    #[serde(default)]
    pub change_1d: Option<f64>,
    #[serde(default, rename = "chainTvls")]
    pub chain_tvls: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct PeggedAmount {
    #[serde(default, rename = "peggedUSD")]
    pub pegged_usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ChainCirculating {
    pub current: Option<PeggedAmount>,
}

#[derive(Debug, Deserialize)]
pub struct PeggedAsset {
    pub symbol: String,
    #[serde(default, rename = "chainCirculating")]
    pub chain_circulating: HashMap<String, ChainCirculating>,
}

#[derive(Debug, Deserialize)]
struct StablecoinsResponse {
    #[serde(default, rename = "peggedAssets")]
    pegged_assets: Vec<PeggedAsset>,
}

#[derive(Debug, Deserialize)]
pub struct DexProtocol {
    pub name: String,
    #[serde(default, rename = "total24h")]
    pub total_24h: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DexOverview {
    #[serde(default, rename = "total24h")]
    pub total_24h: Option<f64>,
    #[serde(default, rename = "total7d")]
    pub total_7d: Option<f64>,
    #[serde(default)]
    pub protocols: Vec<DexProtocol>,
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn summarize_chains(chains: &[LlamaChain]) -> ChainTvl {
    ChainTvl {
        ethereum: chains
            .iter()
            .find(|c| c.name == CHAIN)
            .map(|c| c.tvl)
            .unwrap_or(0.0),
        total: chains.iter().map(|c| c.tvl).sum(),
    }
}

/// Protocols ranked by their Ethereum TVL, largest first.
pub fn top_protocols(protocols: Vec<LlamaProtocol>, n: usize) -> Vec<ProtocolTvl> {
    let mut out: Vec<ProtocolTvl> = protocols
        .into_iter()
        .filter_map(|p| {
            let tvl = p.chain_tvls.get(CHAIN).and_then(Value::as_f64)?;
            (tvl > 0.0).then(|| ProtocolTvl {
                name: p.name,
                tvl,
                change_1d: p.change_1d.unwrap_or(0.0),
            })
        })
        .collect();
    out.sort_by(|a, b| desc(a.tvl, b.tvl));
    out.truncate(n);
    out
}

pub fn top_stablecoins(assets: Vec<PeggedAsset>, n: usize) -> Vec<StablecoinSupply> {
    let mut out: Vec<StablecoinSupply> = assets
        .into_iter()
        .filter_map(|a| {
            let circulating = a
                .chain_circulating
                .get(CHAIN)
                .and_then(|c| c.current.as_ref())
                .and_then(|c| c.pegged_usd)
                .unwrap_or(0.0);
            (circulating > 0.0).then(|| StablecoinSupply {
                symbol: a.symbol,
                circulating,
            })
        })
        .collect();
    out.sort_by(|a, b| desc(a.circulating, b.circulating));
    out.truncate(n);
    out
}

pub fn summarize_dex(overview: DexOverview, n: usize) -> DexVolume {
    let mut top: Vec<DexVenue> = overview
        .protocols
        .into_iter()
        .filter_map(|p| {
            let v = p.total_24h.unwrap_or(0.0);
            (v > 0.0).then(|| DexVenue {
                name: p.name,
                volume_24h: v,
            })
        })
        .collect();
    top.sort_by(|a, b| desc(a.volume_24h, b.volume_24h));
    top.truncate(n);
    DexVolume {
        total_24h: overview.total_24h.unwrap_or(0.0),
        total_7d: overview.total_7d.unwrap_or(0.0),
        top,
    }
}

pub struct DefiLlamaClient {
    http: Arc<HttpFetcher>,
    api: String,
    stablecoins_api: String,
}

impl DefiLlamaClient {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self {
            http,
            api: DEFILLAMA_API.to_string(),
            stablecoins_api: STABLECOINS_API.to_string(),
        }
    }

    pub async fn chain_tvl(&self) -> Result<ChainTvl, SourceError> {
        let url = format!("{}/v2/chains", self.api);
        let chains: Vec<LlamaChain> = self.http.get_json(&url, &[]).await?;
        Ok(summarize_chains(&chains))
    }

    pub async fn top_protocols(&self, n: usize) -> Result<Vec<ProtocolTvl>, SourceError> {
        let url = format!("{}/protocols", self.api);
        let protocols: Vec<LlamaProtocol> = self.http.get_json(&url, &[]).await?;
        Ok(top_protocols(protocols, n))
    }

    pub async fn top_stablecoins(&self, n: usize) -> Result<Vec<StablecoinSupply>, SourceError> {
        let url = format!("{}/stablecoins?includePrices=true", self.stablecoins_api);
        let rsp: StablecoinsResponse = self.http.get_json(&url, &[]).await?;
        Ok(top_stablecoins(rsp.pegged_assets, n))
    }

    pub async fn dex_volume(&self, n: usize) -> Result<DexVolume, SourceError> {
        let url = format!(
            "{}/overview/dexs/ethereum?excludeTotalDataChart=true&excludeTotalDataChartBreakdown=true",
            self.api
        );
        let overview: DexOverview = self.http.get_json(&url, &[]).await?;
        Ok(summarize_dex(overview, n))
    }
}
