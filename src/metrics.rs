use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once at startup.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("digest_runs_total", "Scheduled or triggered digest runs");
    describe_counter!("digest_items_sent_total", "Stories delivered by the digest");
    describe_gauge!("digest_last_run_ts", "Unix time of the last successful scheduled digest");
    describe_counter!("cache_hits_total", "Cache-aside hits");
    describe_counter!("cache_misses_total", "Cache-aside misses");
    describe_counter!("cache_fallback_total", "Fetch failures served from a cached copy");
    describe_counter!("source_errors_total", "Upstream calls that failed after retries");
    describe_counter!("source_branch_errors_total", "Failed branches of a concurrent fan-out");
    describe_histogram!("feed_parse_ms", "RSS parse time in milliseconds");
    describe_counter!("feed_items_total", "Items parsed from RSS feeds");
    describe_counter!("delivery_errors_total", "Messages the chat provider did not accept");
    describe_counter!("commands_total", "Recognized chat commands, by command");
}
