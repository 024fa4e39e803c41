use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::command::Update;
use crate::dispatch::Dispatcher;

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";
pub const TRIGGER_HEADER: &str = "x-trigger-token";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// When set, `/webhook` and `/trigger` require it.
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, webhook_secret: Option<String>) -> Self {
        Self {
            dispatcher,
            webhook_secret,
        }
    }

    fn authorized(&self, presented: Option<&str>) -> bool {
        match &self.webhook_secret {
            None => true,
            Some(secret) => presented == Some(secret.as_str()),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .route("/trigger", get(trigger).post(trigger))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Always 200 once authorized, whatever the body or the dispatch outcome.
async fn webhook(State(st): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !st.authorized(presented) {
        tracing::warn!("webhook call with a bad secret token");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            let dispatcher = st.dispatcher.clone();
            tokio::spawn(async move { dispatcher.handle_update(update).await });
        }
        Err(e) => tracing::warn!(error = %e, "ignoring malformed update"),
    }
    (StatusCode::OK, "OK").into_response()
}

async fn trigger(
    State(st): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let presented = headers
        .get(TRIGGER_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| q.get("token").map(String::as_str));
    if !st.authorized(presented) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    match st.dispatcher.run_digest().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "manual digest failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}
