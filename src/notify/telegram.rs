// src/notify/telegram.rs
use std::time::Duration;

use metrics::counter;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{DeliveryError, Messenger};
use crate::format::Markup;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Bot API `sendMessage` client. One attempt per message; callers own retries.
pub struct TelegramClient {
    client: Client,
    base: String,
    token: String,
    markup: Markup,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, markup: Markup) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            markup,
        })
    }

    /// Point at another API host (self-hosted bot API server, tests).
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Carries the token; never log it or put it in an error.
    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base, self.token)
    }

    async fn post(&self, body: &SendMessage<'_>) -> Result<(), DeliveryError> {
        let rsp = self
            .client
            .post(self.endpoint())
            .json(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;
        // The bot API reports failures in the body even for 4xx statuses.
        let api: ApiResponse = rsp.json().await.map_err(|e| {
            DeliveryError::Transport(format!("unreadable response: {}", e.without_url()))
        })?;
        if api.ok {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                code: api.error_code,
                description: api.description.unwrap_or_else(|| "Unknown error".into()),
            })
        }
    }
}

#[async_trait::async_trait]
impl Messenger for TelegramClient {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: self.markup.parse_mode(),
            disable_web_page_preview: false,
        };

        let result = self.post(&body).await;

        match &result {
            Ok(()) => tracing::debug!(chat_id, len = text.len(), "message delivered"),
            Err(e) => {
                counter!("delivery_errors_total").increment(1);
                tracing::warn!(chat_id, error = %e, "message delivery failed");
            }
        }
        result
    }
}
