// src/config/mod.rs
//! Runtime settings: secrets and ids from the environment, tunables from
//! an optional TOML file. Env values override the file.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;

pub use file::{FileSettings, DEFAULT_BOT_CONFIG_PATH};

use crate::format::Markup;
use crate::ingest::http::DEFAULT_TIMEOUT;
use crate::notify::telegram::TELEGRAM_API_BASE;
use crate::store::DEFAULT_STORE_PATH;

pub const DEFAULT_HN_TOP_N: usize = 10;
pub const DEFAULT_DIGEST_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_CURRENCY_API_KEY: &str = "CURRENCY_API_KEY";
pub const ENV_HN_TOP_N: &str = "HN_TOP_N";
pub const ENV_WEBHOOK_SECRET: &str = "WEBHOOK_SECRET";
pub const ENV_API_BASE: &str = "TELEGRAM_API_BASE";
pub const ENV_DIGEST_INTERVAL: &str = "DIGEST_INTERVAL_SECS";
pub const ENV_CONFIG_PATH: &str = "BOT_CONFIG_PATH";
pub const ENV_PARSE_MODE: &str = "TELEGRAM_PARSE_MODE";
pub const ENV_PRICE_FEED: &str = "PRICE_FEED";
pub const ENV_STORE_PATH: &str = "STORE_PATH";

/// `STORE_PATH` value that selects the in-process store.
pub const MEMORY_STORE: &str = "memory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceFeedKind {
    #[default]
    Binance,
    Coinbase,
    CoinGecko,
}

impl std::str::FromStr for PriceFeedKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "coinbase" => Ok(Self::Coinbase),
            "coingecko" => Ok(Self::CoinGecko),
            other => Err(anyhow!("unknown price feed `{other}` (binance|coinbase|coingecko)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bot_token: String,
    pub chat_id: String,
    pub currency_api_key: Option<String>,
    pub hn_top_n: usize,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    /// `None` disables the timer.
    pub digest_interval: Option<Duration>,
    pub markup: Markup,
    pub price_feed: PriceFeedKind,
    /// Empty means the provider default list.
    pub price_symbols: Vec<String>,
    pub http_timeout: Duration,
    /// Snapshot file for the store; `None` keeps everything in process.
    pub store_path: Option<PathBuf>,
}

/// Invalid or non-positive values fall back to the default.
pub fn parse_top_n(raw: Option<&str>) -> usize {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_HN_TOP_N,
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Settings {
    /// Reads the process environment and `$BOT_CONFIG_PATH`.
    pub fn from_env() -> Result<Self> {
        let lookup = |k: &str| std::env::var(k).ok();
        let path = non_blank(lookup(ENV_CONFIG_PATH))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOT_CONFIG_PATH));
        let file = FileSettings::load_optional(&path)?;
        Self::from_lookup(lookup, file)
    }

    pub fn from_lookup<F>(lookup: F, file: FileSettings) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(bot_token) = non_blank(lookup(ENV_BOT_TOKEN)) else {
            bail!("{ENV_BOT_TOKEN} is required");
        };
        let Some(chat_id) = non_blank(lookup(ENV_CHAT_ID)) else {
            bail!("{ENV_CHAT_ID} is required");
        };

        let digest_interval = match non_blank(lookup(ENV_DIGEST_INTERVAL)) {
            None => Some(DEFAULT_DIGEST_INTERVAL),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => bail!("{ENV_DIGEST_INTERVAL} must be a whole number of seconds, got `{raw}`"),
            },
        };

        let markup = match non_blank(lookup(ENV_PARSE_MODE)) {
            Some(raw) => raw.parse::<Markup>().map_err(|e| anyhow!("{ENV_PARSE_MODE}: {e}"))?,
            None => file.parse_mode.unwrap_or_default(),
        };
        let price_feed = match non_blank(lookup(ENV_PRICE_FEED)) {
            Some(raw) => raw.parse::<PriceFeedKind>()?,
            None => file.price_feed.unwrap_or_default(),
        };

        let http_timeout = match file.http_timeout_secs {
            Some(0) | None => DEFAULT_TIMEOUT,
            Some(secs) => Duration::from_secs(secs),
        };

        let store_path = match non_blank(lookup(ENV_STORE_PATH)).or(non_blank(file.store_path)) {
            Some(p) if p.eq_ignore_ascii_case(MEMORY_STORE) => None,
            Some(p) => Some(PathBuf::from(p)),
            None => Some(PathBuf::from(DEFAULT_STORE_PATH)),
        };

        Ok(Self {
            bot_token,
            chat_id,
            currency_api_key: non_blank(lookup(ENV_CURRENCY_API_KEY)),
            hn_top_n: parse_top_n(lookup(ENV_HN_TOP_N).as_deref()),
            webhook_secret: non_blank(lookup(ENV_WEBHOOK_SECRET)),
            api_base: non_blank(lookup(ENV_API_BASE)).unwrap_or_else(|| TELEGRAM_API_BASE.to_string()),
            digest_interval,
            markup,
            price_feed,
            price_symbols: file
                .price_symbols
                .unwrap_or_default()
                .into_iter()
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            http_timeout,
            store_path,
        })
    }
}
