// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /webhook  (dispatch, malformed body, secret)
// - GET|POST /trigger  (report, token, failure)

mod common;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use std::sync::Arc;

use common::{command_update, fake_sources, harness, FakeStories, Harness, HarnessBuilder};
use digest_courier::format::Markup;
use digest_courier::notify::TelegramClient;
use digest_courier::store::MemoryStore;
use digest_courier::{create_router, AppState, DispatchConfig, Dispatcher};

const BODY_LIMIT: usize = 1024 * 1024;

fn router(h: &Harness, secret: Option<&str>) -> Router {
    create_router(AppState::new(h.dispatcher.clone(), secret.map(str::to_string)))
}

async fn body_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok_with_timestamp() {
    let h = harness();
    let resp = router(&h, None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["status"], "ok");
    let ts = v["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "rfc3339 timestamp: {ts}");
}

#[tokio::test]
async fn webhook_acks_and_dispatches_in_background() {
    let h = harness();
    let resp = router(&h, None)
        .oneshot(post_json("/webhook", command_update(42, "/btc").to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "OK");

    let msgs = h.messenger.wait_for(1).await;
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].0, "42");
}

#[tokio::test]
async fn webhook_acks_malformed_bodies() {
    let h = harness();
    let resp = router(&h, None)
        .oneshot(post_json("/webhook", "{not json".into()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(h.messenger.messages().is_empty());
}

#[tokio::test]
async fn webhook_secret_mismatch_is_rejected_without_dispatch() {
    let h = harness();
    let live = router(&h, Some("s3cret"));

    let resp = live
        .clone()
        .oneshot(post_json("/webhook", command_update(1, "/btc").to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let mut req = post_json("/webhook", command_update(1, "/btc").to_string());
    req.headers_mut()
        .insert("x-telegram-bot-api-secret-token", "s3cret".parse().unwrap());
    let resp = live.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let msgs = h.messenger.wait_for(1).await;
    assert_eq!(msgs.len(), 1, "only the authorized call dispatched");
}

#[tokio::test]
async fn trigger_runs_digest_and_reports() {
    let h = harness();
    let resp = router(&h, None)
        .oneshot(Request::post("/trigger").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v, serde_json::json!({"fetched": 3, "sent": 3, "skipped": 0}));
    assert_eq!(h.messenger.messages().len(), 1);
}

#[tokio::test]
async fn trigger_token_via_query_or_header() {
    let h = harness();
    let app = router(&h, Some("tok"));

    let denied = app
        .clone()
        .oneshot(Request::get("/trigger?token=nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let by_query = app
        .clone()
        .oneshot(Request::get("/trigger?token=tok").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(by_query.status(), StatusCode::OK);

    let by_header = app
        .oneshot(
            Request::get("/trigger")
                .header("x-trigger-token", "tok")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(by_header.status(), StatusCode::OK);
    assert_eq!(body_json(by_header).await["skipped"], 3);
}

#[tokio::test]
async fn trigger_failure_is_500() {
    let h = HarnessBuilder {
        stories: FakeStories::failing(),
        ..HarnessBuilder::default()
    }
    .build();
    let resp = router(&h, None)
        .oneshot(Request::get("/trigger").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(resp).await["error"].as_str().unwrap().contains("top stories"));
}

#[tokio::test]
async fn unknown_path_is_404() {
    let h = harness();
    let resp = router(&h, None)
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trigger_failure_body_hides_the_bot_token() {
    let messenger = TelegramClient::new("987654:SECRET-TOKEN", Markup::Markdown)
        .unwrap()
        .with_base("http://127.0.0.1:1");
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(MemoryStore::with_system_clock()),
        fake_sources(3),
        Arc::new(messenger),
        DispatchConfig::new("-1001"),
    ));
    let resp = create_router(AppState::new(dispatcher, None))
        .oneshot(Request::get("/trigger").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(resp).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("delivering digest"), "{error}");
    assert!(!error.contains("SECRET-TOKEN"), "{error}");
}
