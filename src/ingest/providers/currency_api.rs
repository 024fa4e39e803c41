// src/ingest/providers/currency_api.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{ExchangeRates, RateQuote, RateSource, SourceError};

pub const CURRENCY_API_URL: &str = "https://api.currencyapi.com/v3/latest";

/// Quote currencies, in display order.
pub const CURRENCIES: [&str; 7] = ["PHP", "MYR", "TWD", "HKD", "CNY", "THB", "VND"];

#[derive(Debug, Deserialize)]
struct RateItem {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct Meta {
    last_updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    meta: Option<Meta>,
    data: HashMap<String, RateItem>,
}

/// `2025-10-13T23:59:59Z` -> `2025-10-13 23:59 UTC`
pub fn format_updated_at(iso: &str) -> Option<String> {
    let dt = DateTime::parse_from_rfc3339(iso.trim()).ok()?;
    Some(dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M UTC").to_string())
}

fn to_rates(rsp: LatestResponse) -> ExchangeRates {
    let rates = CURRENCIES
        .iter()
        .map(|code| RateQuote {
            code: code.to_string(),
            value: rsp.data.get(*code).map(|r| r.value).unwrap_or(0.0),
        })
        .collect();
    ExchangeRates {
        rates,
        updated_at: rsp
            .meta
            .and_then(|m| m.last_updated_at)
            .as_deref()
            .and_then(format_updated_at),
    }
}

/// USD base rates from currencyapi.com; the key travels in the `apikey` header.
pub struct CurrencyApiClient {
    http: Arc<HttpFetcher>,
    api_key: String,
    url: String,
}

impl CurrencyApiClient {
    pub fn new(http: Arc<HttpFetcher>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            url: CURRENCY_API_URL.to_string(),
        }
    }
}

#[async_trait]
impl RateSource for CurrencyApiClient {
    async fn fetch(&self) -> Result<ExchangeRates, SourceError> {
        let url = format!(
            "{}?base_currency=USD&currencies={}",
            self.url,
            CURRENCIES.join(",")
        );
        let rsp: LatestResponse = self
            .http
            .get_json(&url, &[("apikey", self.api_key.as_str())])
            .await?;
        Ok(to_rates(rsp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_keep_display_order_and_default_missing_to_zero() {
        let rsp: LatestResponse = serde_json::from_str(
            r#"{
                "meta": {"last_updated_at": "2025-10-13T23:59:59Z"},
                "data": {
                    "VND": {"code": "VND", "value": 26345.5},
                    "PHP": {"code": "PHP", "value": 58.1},
                    "CNY": {"code": "CNY", "value": 7.12}
                }
            }"#,
        )
        .unwrap();
        let rates = to_rates(rsp);
        let codes: Vec<_> = rates.rates.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, CURRENCIES.to_vec());
        assert_eq!(rates.rates[0].value, 58.1);
        assert_eq!(rates.rates[1].value, 0.0);
        assert_eq!(rates.updated_at.as_deref(), Some("2025-10-13 23:59 UTC"));
    }

    #[test]
    fn bad_timestamp_is_dropped() {
        assert_eq!(format_updated_at("yesterday"), None);
        assert_eq!(
            format_updated_at("2025-10-13T10:05:00+02:00").as_deref(),
            Some("2025-10-13 08:05 UTC")
        );
    }
}
