// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::dispatch::Dispatcher;

/// Spawn the digest timer. The first run happens one `period` after start;
/// the manual `/trigger` endpoint covers the "run now" case.
pub fn spawn_digest_scheduler(dispatcher: Arc<Dispatcher>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_secs = period.as_secs(), "digest scheduler started");
        loop {
            ticker.tick().await;
            run_tick(&dispatcher).await;
        }
    })
}

/// One scheduled invocation. Failures are logged; the timer keeps going.
pub async fn run_tick(dispatcher: &Dispatcher) {
    match dispatcher.run_digest().await {
        Ok(report) => {
            gauge!("digest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
            tracing::info!(target: "scheduler", sent = report.sent, skipped = report.skipped, "digest tick");
        }
        Err(e) => tracing::error!(target: "scheduler", error = ?e, "digest tick failed"),
    }
}
