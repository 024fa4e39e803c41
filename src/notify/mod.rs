// src/notify/mod.rs
pub mod telegram;

pub use telegram::TelegramClient;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The provider answered `ok: false`.
    #[error("message rejected ({code:?}): {description}")]
    Rejected {
        code: Option<i64>,
        description: String,
    },
    #[error("message delivery failed: {0}")]
    Transport(String),
}

/// Outbound chat transport.
#[async_trait::async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), DeliveryError>;
}
