// src/config/file.rs
//! Optional TOML file with non-secret tunables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::PriceFeedKind;
use crate::format::Markup;

pub const DEFAULT_BOT_CONFIG_PATH: &str = "config/bot.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub parse_mode: Option<Markup>,
    pub price_feed: Option<PriceFeedKind>,
    pub price_symbols: Option<Vec<String>>,
    pub http_timeout_secs: Option<u64>,
    /// Path of the store snapshot, or `memory`.
    pub store_path: Option<String>,
}

impl FileSettings {
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing bot config")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading bot config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    /// A missing file means defaults; an unreadable or invalid one is an error.
    pub fn load_optional(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no bot config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }
}
