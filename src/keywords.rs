// src/keywords.rs
//! Topical tags for stories: frequency-ranked words with a fixed English
//! stop-word list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tracing::{debug, warn};

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::KeywordSource;

pub const DEFAULT_KEYWORD_COUNT: usize = 10;
const MIN_WORD_LEN: usize = 3;

#[rustfmt::skip]
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not",
        "on", "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from",
        "they", "we", "say", "her", "she", "or", "an", "will", "my", "one", "all", "would",
        "there", "their", "what", "so", "up", "out", "if", "about", "who", "get", "which",
        "go", "me", "when", "make", "can", "like", "time", "no", "just", "him", "know",
        "take", "people", "into", "year", "your", "good", "some", "could", "them", "see",
        "other", "than", "then", "now", "look", "only", "come", "its", "over", "think",
        "also", "back", "after", "use", "two", "how", "our", "work", "first", "well", "way",
        "even", "new", "want", "because", "any", "these", "give", "day", "most", "us", "is",
        "was", "are", "were", "been", "has", "had", "did", "does", "doing", "done", "above",
        "more", "thing", "things", "others", "something", "anything", "everything",
        "nothing", "someone", "anyone", "everyone", "nobody", "somewhere", "anywhere",
        "everywhere", "nowhere", "such", "own", "same", "very", "much", "many", "another",
        "each", "every", "both", "few", "little", "less", "across", "against", "along",
        "among", "around", "before", "behind", "below", "beneath", "beside", "between",
        "beyond", "during", "except", "inside", "near", "off", "onto", "outside", "through",
        "throughout", "toward", "towards", "under", "underneath", "until", "upon", "within",
        "without", "via", "per",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|w| w.len() >= MIN_WORD_LEN)
        .map(str::to_string)
        .collect()
}

/// Top `count` words of `text` by frequency. Ties keep first-seen order.
pub fn extract_keywords(text: &str, count: usize) -> Vec<String> {
    if text.trim().is_empty() || count == 0 {
        return Vec::new();
    }

    let mut order: Vec<String> = Vec::new();
    let mut freq: HashMap<String, usize> = HashMap::new();
    for word in tokenize(text).into_iter().filter(|w| !is_stop_word(w)) {
        let n = freq.entry(word.clone()).or_insert(0);
        if *n == 0 {
            order.push(word);
        }
        *n += 1;
    }

    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| freq[b].cmp(&freq[a]));
    order.truncate(count);
    order
}

/// Visible text of an HTML page: script/style blocks and tags removed.
pub fn html_to_text(html: &str) -> String {
    static RE_BLOCKS: OnceCell<Regex> = OnceCell::new();
    let re_blocks = RE_BLOCKS.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>").unwrap()
    });
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]+>").unwrap());

    let out = re_blocks.replace_all(html, " ");
    let out = re_tags.replace_all(&out, " ");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Combine body keywords with title keywords when the body alone yields fewer than `count`.
pub fn merge_with_title(mut keywords: Vec<String>, title: &str, count: usize) -> Vec<String> {
    if keywords.len() >= count {
        return keywords;
    }
    for kw in extract_keywords(title, count) {
        if keywords.len() >= count {
            break;
        }
        if !keywords.contains(&kw) {
            keywords.push(kw);
        }
    }
    keywords
}

/// Tags from the article body, falling back to the title on any fetch failure.
pub struct ArticleKeywords {
    http: Arc<HttpFetcher>,
}

impl ArticleKeywords {
    pub fn new(http: Arc<HttpFetcher>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl KeywordSource for ArticleKeywords {
    async fn keywords_for(&self, url: &str, title: &str, count: usize) -> Vec<String> {
        let html = match self.http.get_text(url, &[]).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%url, error = %e, "article fetch failed, using title keywords");
                return extract_keywords(title, count);
            }
        };
        let combined = format!("{title} {}", html_to_text(&html));
        let keywords = extract_keywords(&combined, count);
        debug!(%url, found = keywords.len(), "article keywords");
        merge_with_title(keywords, title, count)
    }
}
