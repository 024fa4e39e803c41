// src/dispatch.rs
//! Orchestration: scheduled digest and on-demand commands.
//!
//! The digest is the only path that consults the ledger. Commands always
//! deliver, possibly from cache.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheAside, FailurePolicy, TTL_AGGREGATED, TTL_COMMAND, TTL_VOLATILE};
use crate::command::{help_text, parse_command, resolve, Action, ParsedCommand, Update};
use crate::format::{self, Markup};
use crate::ingest::cap_chars;
use crate::ingest::types::{
    Article, ArticleFeed, BriefSnapshot, BriefSource, ExchangeRates, KeywordSource, PriceTick,
    ProcessedStory, RateSource, SourcePriceFeed, StorySource,
};
use crate::keywords::{extract_keywords, DEFAULT_KEYWORD_COUNT};
use crate::ledger::SentLedger;
use crate::notify::Messenger;
use crate::store::KvStore;

pub const ERROR_REPLY_MAX: usize = 200;

pub const KEY_ARS: &str = "ars:top10";
pub const KEY_PRICES: &str = "crypto:prices";
pub const KEY_RATES: &str = "exrate:latest";
pub const KEY_BRIEF: &str = "eth:brief";

pub fn hn_range_key(start: usize, end: usize) -> String {
    format!("hn:top{start}-{end}")
}

/// Collaborators wired in at startup. Any conforming implementation works.
#[derive(Clone)]
pub struct Sources {
    pub stories: Arc<dyn StorySource>,
    pub articles: Arc<dyn ArticleFeed>,
    pub prices: Arc<dyn SourcePriceFeed>,
    /// `None` when no rate API key is configured.
    pub rates: Option<Arc<dyn RateSource>>,
    pub brief: Arc<dyn BriefSource>,
    /// Used by the digest only; commands tag from titles.
    pub keywords: Arc<dyn KeywordSource>,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub markup: Markup,
    pub digest_chat_id: String,
    pub top_n: usize,
    pub keyword_count: usize,
}

impl DispatchConfig {
    pub fn new(digest_chat_id: impl Into<String>) -> Self {
        Self {
            markup: Markup::default(),
            digest_chat_id: digest_chat_id.into(),
            top_n: crate::config::DEFAULT_HN_TOP_N,
            keyword_count: DEFAULT_KEYWORD_COUNT,
        }
    }
}

/// Outcome of one digest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestReport {
    pub fetched: usize,
    pub sent: usize,
    pub skipped: usize,
}

pub struct Dispatcher {
    cache: CacheAside,
    ledger: SentLedger,
    sources: Sources,
    messenger: Arc<dyn Messenger>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn KvStore>,
        sources: Sources,
        messenger: Arc<dyn Messenger>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            cache: CacheAside::new(store.clone()),
            ledger: SentLedger::new(store),
            sources,
            messenger,
            config,
        }
    }

    /// Scheduled digest: top N stories not yet delivered, one message.
    ///
    /// Stories are processed one at a time and marked only after the send
    /// succeeded, so a failed delivery is retried on the next run.
    pub async fn run_digest(&self) -> anyhow::Result<DigestReport> {
        counter!("digest_runs_total").increment(1);
        let started = std::time::Instant::now();
        info!(top_n = self.config.top_n, "digest run starting");

        let stories = self
            .sources
            .stories
            .top_stories(self.config.top_n)
            .await
            .context("fetching top stories")?;

        let mut report = DigestReport {
            fetched: stories.len(),
            ..DigestReport::default()
        };
        if stories.is_empty() {
            info!("no stories to process");
            return Ok(report);
        }

        let mut fresh: Vec<ProcessedStory> = Vec::with_capacity(stories.len());
        for story in stories {
            if self.ledger.was_sent(story.id).await {
                debug!(id = story.id, "already sent, skipping");
                report.skipped += 1;
                continue;
            }
            let keywords = self
                .sources
                .keywords
                .keywords_for(&story.url, &story.title, self.config.keyword_count)
                .await;
            fresh.push(ProcessedStory::from_story(story, keywords));
        }

        if fresh.is_empty() {
            info!(skipped = report.skipped, "no new stories to send");
            return Ok(report);
        }

        let text = format::hn::format_daily_digest(self.config.markup, &fresh, Utc::now().date_naive());
        self.messenger
            .send(&self.config.digest_chat_id, &text)
            .await
            .context("delivering digest")?;

        for story in &fresh {
            self.ledger.mark_sent(story.id).await;
        }
        report.sent = fresh.len();
        counter!("digest_items_sent_total").increment(report.sent as u64);
        info!(
            fetched = report.fetched,
            sent = report.sent,
            skipped = report.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "digest run finished"
        );
        Ok(report)
    }

    /// Webhook entry. Never fails: non-commands and unknown commands are
    /// ignored, and command failures become a short error reply.
    pub async fn handle_update(&self, update: Update) {
        let Some(cmd) = parse_command(&update) else {
            debug!(update_id = update.update_id, "no command in update");
            return;
        };
        let Some(action) = resolve(&cmd.name) else {
            debug!(command = %cmd.name, "unknown command ignored");
            return;
        };
        counter!("commands_total", "command" => cmd.name.clone()).increment(1);

        if let Err(e) = self.handle_command(&cmd, action).await {
            error!(command = %cmd.name, chat_id = cmd.chat_id, error = ?e, "command failed");
            let reply = format!("❌ Error: {}", cap_chars(&format!("{e:#}"), ERROR_REPLY_MAX));
            let reply = self.config.markup.escape(&reply);
            if let Err(e) = self.messenger.send(&cmd.chat_id.to_string(), &reply).await {
                warn!(chat_id = cmd.chat_id, error = %e, "error reply not delivered");
            }
        }
    }

    pub async fn handle_command(&self, cmd: &ParsedCommand, action: Action) -> anyhow::Result<()> {
        info!(command = %cmd.name, chat_id = cmd.chat_id, "handling command");
        let text = self.render(action).await?;
        self.messenger
            .send(&cmd.chat_id.to_string(), &text)
            .await
            .with_context(|| format!("replying to {}", cmd.name))?;
        Ok(())
    }

    /// Message text for `action`, going through the cache where the action has one.
    pub async fn render(&self, action: Action) -> anyhow::Result<String> {
        let markup = self.config.markup;
        match action {
            Action::HnRange { start, end } => {
                let source = &self.sources.stories;
                let count = self.config.keyword_count;
                let stories: Vec<ProcessedStory> = self
                    .cache
                    .get_or_fetch(&hn_range_key(start, end), TTL_COMMAND, FailurePolicy::SoftEmpty, move || async move {
                        source.stories_in_range(start, end).await.map(|list| {
                            list.into_iter()
                                .map(|s| {
                                    let kws = extract_keywords(&s.title, count);
                                    ProcessedStory::from_story(s, kws)
                                })
                                .collect()
                        })
                    })
                    .await?;
                Ok(format::hn::format_stories_range(markup, &stories, start, end))
            }
            Action::ArsTop => {
                let feed = &self.sources.articles;
                let articles: Vec<Article> = self
                    .cache
                    .get_or_fetch(KEY_ARS, TTL_AGGREGATED, FailurePolicy::SoftEmpty, move || feed.fetch())
                    .await?;
                Ok(format::ars::format_ars_articles(markup, &articles))
            }
            Action::Prices => {
                let feed = &self.sources.prices;
                let ticks: Vec<PriceTick> = self
                    .cache
                    .get_or_fetch(KEY_PRICES, TTL_VOLATILE, FailurePolicy::SoftEmpty, move || feed.fetch())
                    .await?;
                Ok(format::prices::format_crypto_prices(markup, &ticks))
            }
            Action::ExchangeRates => {
                let Some(source) = &self.sources.rates else {
                    return Ok(markup.escape(
                        "⚠️ Exchange rates are not configured (CURRENCY_API_KEY is missing).",
                    ));
                };
                let rates: ExchangeRates = self
                    .cache
                    .get_or_fetch(KEY_RATES, TTL_VOLATILE, FailurePolicy::HardFail, move || source.fetch())
                    .await
                    .context("fetching exchange rates")?;
                Ok(format::rates::format_exchange_rates(markup, &rates))
            }
            Action::EthBrief => {
                let brief = &self.sources.brief;
                let text: String = self
                    .cache
                    .get_or_fetch(KEY_BRIEF, TTL_VOLATILE, FailurePolicy::SoftEmpty, move || async move {
                        let snap = brief.gather().await;
                        // a brief where every branch failed is not worth caching
                        if snap == BriefSnapshot::default() {
                            Ok(String::new())
                        } else {
                            Ok(format::brief::format_eth_brief(markup, &snap, Utc::now()))
                        }
                    })
                    .await?;
                if text.is_empty() {
                    return Ok(format::brief::format_eth_brief(markup, &BriefSnapshot::default(), Utc::now()));
                }
                Ok(text)
            }
            Action::FlushCache => {
                let deleted = self.ledger.flush().await.context("flushing store")?;
                info!(deleted, "store flushed");
                Ok(markup.escape(&format!("🗑️ Cache cleared: {deleted} keys deleted.")))
            }
            Action::Help => Ok(markup.escape(&help_text())),
        }
    }
}
