// src/ingest/providers/ars_rss.rs
use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{Article, ArticleFeed, SourceError};
use crate::ingest::{cap_chars, clean_text};

pub const ARS_RSS_URL: &str = "https://arstechnica.com/feed/";
pub const MAX_ARTICLES: usize = 10;
const EXCERPT_CHARS: usize = 200;
const DEFAULT_AUTHOR: &str = "Ars Technica";

pub struct ArsRssFeed {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, http: Arc<HttpFetcher> },
}

impl ArsRssFeed {
    pub fn from_fixture(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, http: Arc<HttpFetcher>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                http,
            },
        }
    }

    pub fn live(http: Arc<HttpFetcher>) -> Self {
        Self::from_url(ARS_RSS_URL, http)
    }
}

#[async_trait]
impl ArticleFeed for ArsRssFeed {
    async fn fetch(&self) -> Result<Vec<Article>, SourceError> {
        match &self.mode {
            Mode::Fixture(xml) => parse_feed(xml),
            Mode::Http { url, http } => {
                let body = http.get_text(url, &[]).await?;
                parse_feed(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "ars"
    }
}

#[derive(Default)]
struct ItemDraft {
    title: String,
    link: String,
    description: String,
    pub_date: String,
    creator: String,
    author: String,
}

impl ItemDraft {
    fn push(&mut self, field: &str, chunk: &str) {
        let slot = match field {
            "title" => &mut self.title,
            "link" => &mut self.link,
            "description" => &mut self.description,
            "pubDate" => &mut self.pub_date,
            "dc:creator" => &mut self.creator,
            "author" => &mut self.author,
            _ => return,
        };
        slot.push_str(chunk);
    }

    fn finish(self) -> Option<Article> {
        let title = clean_text(&self.title);
        let url = clean_text(&self.link);
        if title.is_empty() || url.is_empty() {
            return None;
        }
        let author = [self.creator, self.author]
            .iter()
            .map(|a| clean_text(a))
            .find(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
        Some(Article {
            title,
            url,
            excerpt: cap_chars(&clean_text(&self.description), EXCERPT_CHARS),
            published_at: clean_text(&self.pub_date),
            author,
        })
    }
}

/// Parse an RSS 2.0 document into at most [`MAX_ARTICLES`] articles.
///
/// Text is taken raw (entities still encoded) and cleaned afterwards, so
/// HTML-only entities such as `&nbsp;` never trip the XML reader.
pub fn parse_feed(xml: &str) -> Result<Vec<Article>, SourceError> {
    let t0 = std::time::Instant::now();
    let mut reader = Reader::from_str(xml);

    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut item: Option<(ItemDraft, usize)> = None;
    let mut field: Option<(String, usize)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let item_depth = item.as_ref().map(|(_, d)| *d);
                match item_depth {
                    None if name == "item" => item = Some((ItemDraft::default(), depth)),
                    Some(d) if field.is_none() && depth == d + 1 => field = Some((name, depth)),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                if matches!(&field, Some((_, d)) if *d == depth) {
                    field = None;
                } else if matches!(&item, Some((_, d)) if *d == depth) {
                    if let Some((draft, _)) = item.take() {
                        if let Some(article) = draft.finish() {
                            out.push(article);
                            if out.len() >= MAX_ARTICLES {
                                break;
                            }
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                if let (Some((draft, _)), Some((name, _))) = (item.as_mut(), field.as_ref()) {
                    draft.push(name, &String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some((draft, _)), Some((name, _))) = (item.as_mut(), field.as_ref()) {
                    draft.push(name, &String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                if out.is_empty() {
                    return Err(SourceError::Payload(format!("rss: {e}")));
                }
                tracing::warn!(error = %e, kept = out.len(), "rss parse stopped early");
                break;
            }
            _ => {}
        }
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_items_total").increment(out.len() as u64);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
  <title>Ars Technica</title>
  <link>https://arstechnica.com</link>
  <item>
    <title>New chip &amp; old tricks</title>
    <link>https://arstechnica.com/a</link>
    <description><![CDATA[<p>The chip is <b>fast</b>&nbsp;and cheap.</p>]]></description>
    <pubDate>Mon, 13 Oct 2025 12:00:00 +0000</pubDate>
    <dc:creator><![CDATA[Jane Doe]]></dc:creator>
  </item>
  <item>
    <title><![CDATA[Second &#8220;story&#8221;]]></title>
    <link>https://arstechnica.com/b</link>
    <description>Plain text</description>
  </item>
  <item>
    <title></title>
    <link>https://arstechnica.com/c</link>
  </item>
</channel>
</rss>"#;

    #[test]
    fn parses_items_and_skips_untitled() {
        let items = parse_feed(FEED).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "New chip & old tricks");
        assert_eq!(items[0].url, "https://arstechnica.com/a");
        assert_eq!(items[0].excerpt, "The chip is fast and cheap.");
        assert_eq!(items[0].author, "Jane Doe");
        assert_eq!(items[0].published_at, "Mon, 13 Oct 2025 12:00:00 +0000");

        assert_eq!(items[1].title, "Second \u{201C}story\u{201D}");
        assert_eq!(items[1].author, "Ars Technica");
    }

    #[test]
    fn caps_item_count_and_excerpt() {
        let long = "word ".repeat(100);
        let mut xml = String::from("<rss><channel>");
        for i in 0..15 {
            xml.push_str(&format!(
                "<item><title>t{i}</title><link>https://x/{i}</link><description>{long}</description></item>"
            ));
        }
        xml.push_str("</channel></rss>");

        let items = parse_feed(&xml).unwrap();
        assert_eq!(items.len(), MAX_ARTICLES);
        assert!(items.iter().all(|a| a.excerpt.chars().count() <= 200));
    }

    #[tokio::test]
    async fn fixture_mode_goes_through_the_trait() {
        let feed = ArsRssFeed::from_fixture(FEED);
        let items = feed.fetch().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(feed.name(), "ars");
    }
}
