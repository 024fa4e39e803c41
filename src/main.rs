//! Digest courier: binary entrypoint.
//! Boots the Axum HTTP server, the digest timer and the metrics route.

use digest_courier::{
    config::Settings, create_router, metrics::Metrics, open_store, scheduler, AppState,
};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// JSON lines when `LOG_FORMAT=json`, compact text otherwise. The runtime may
/// already have installed a subscriber, in which case this is a no-op.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("digest_courier=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env()?;
    let metrics = Metrics::init()?;

    let store = open_store(&settings).await?;
    let dispatcher = digest_courier::build_dispatcher(&settings, store)?;

    match settings.digest_interval {
        Some(period) => {
            scheduler::spawn_digest_scheduler(dispatcher.clone(), period);
        }
        None => tracing::info!("digest timer disabled"),
    }

    let state = AppState::new(dispatcher, settings.webhook_secret.clone());
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
