// src/ingest/mod.rs
pub mod brief;
pub mod http;
pub mod providers;
pub mod retry;
pub mod types;

use std::future::Future;

use futures::future::join_all;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::types::SourceError;

/// Clean a feed text field: drop CDATA wrappers and tags, decode HTML
/// entities (named, decimal and hex), collapse whitespace.
pub fn clean_text(s: &str) -> String {
    // 1) CDATA wrappers
    let out = s.replace("<![CDATA[", "").replace("]]>", "");

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    let out = re_tags.replace_all(&out, " ");

    // 3) Entities
    let out = html_escape::decode_html_entities(&out).to_string();

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Cut to at most `max` chars on a char boundary.
pub fn cap_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Run independent branches concurrently; keep the successes, log the failures.
/// A failing branch never affects its siblings.
pub async fn fan_out<T, I, F>(provider: &str, branches: I) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, SourceError>>,
{
    let results = join_all(branches).await;
    let mut out = Vec::with_capacity(results.len());
    for r in results {
        match r {
            Ok(v) => out.push(v),
            Err(e) => {
                tracing::warn!(provider, error = %e, "fan-out branch failed");
                counter!("source_branch_errors_total").increment(1);
            }
        }
    }
    out
}

/// Collapse a branch result into `Option`, logging the failure.
pub fn soft<T>(branch: &str, r: Result<T, SourceError>) -> Option<T> {
    match r {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(branch, error = %e, "branch failed, section degraded");
            counter!("source_branch_errors_total").increment(1);
            None
        }
    }
}
