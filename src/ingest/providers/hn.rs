// src/ingest/providers/hn.rs
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{SourceError, Story, StorySource};

pub const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Debug, Deserialize)]
struct HnItem {
    id: u64,
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    url: Option<String>,
    score: Option<i64>,
    by: Option<String>,
    time: Option<i64>,
    descendants: Option<u32>,
}

/// Only link stories with a title and a positive score make it through.
fn into_story(item: HnItem) -> Option<Story> {
    if item.kind.as_deref() != Some("story") {
        return None;
    }
    let url = item.url.filter(|u| !u.trim().is_empty())?;
    let title = item.title.filter(|t| !t.trim().is_empty())?;
    let score = item.score.unwrap_or(0);
    if score <= 0 {
        return None;
    }
    Some(Story {
        id: item.id,
        title,
        url,
        score,
        by: item.by.unwrap_or_default(),
        time: item.time.unwrap_or(0),
        descendants: item.descendants.unwrap_or(0),
    })
}

pub struct HackerNewsClient {
    http: Arc<HttpFetcher>,
    base: String,
}

impl HackerNewsClient {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self::with_base(http, HN_API_BASE)
    }

    pub fn with_base(http: Arc<HttpFetcher>, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn top_ids(&self, limit: usize) -> Result<Vec<u64>, SourceError> {
        let url = format!("{}/topstories.json", self.base);
        let mut ids: Vec<u64> = self.http.get_json(&url, &[]).await?;
        ids.truncate(limit);
        Ok(ids)
    }

    /// Per-item failures are swallowed: the item is simply dropped.
    async fn item(&self, id: u64) -> Option<Story> {
        let url = format!("{}/item/{id}.json", self.base);
        match self.http.get_json::<Option<HnItem>>(&url, &[]).await {
            Ok(item) => item.and_then(into_story),
            Err(e) => {
                tracing::warn!(id, error = %e, "hn item fetch failed");
                None
            }
        }
    }

    /// The first `want` eligible stories, over-fetching ids 2:1 since some
    /// entries are jobs, polls or text posts.
    async fn ranked(&self, want: usize) -> Result<Vec<Story>, SourceError> {
        let ids = self.top_ids(want.saturating_mul(2)).await?;
        let items = join_all(ids.into_iter().map(|id| self.item(id))).await;
        Ok(items.into_iter().flatten().take(want).collect())
    }
}

#[async_trait]
impl StorySource for HackerNewsClient {
    async fn top_stories(&self, limit: usize) -> Result<Vec<Story>, SourceError> {
        self.ranked(limit).await
    }

    async fn stories_in_range(&self, start: usize, end: usize) -> Result<Vec<Story>, SourceError> {
        let start = start.max(1);
        if end < start {
            return Ok(Vec::new());
        }
        let stories = self.ranked(end).await?;
        Ok(stories.into_iter().skip(start - 1).take(end - start + 1).collect())
    }
}
