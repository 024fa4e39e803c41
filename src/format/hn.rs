// src/format/hn.rs
use chrono::NaiveDate;

use super::{render_blocks, Markup};
use crate::ingest::types::ProcessedStory;

pub const DIGEST_KEEP: usize = 5;
pub const RANGE_KEEP: usize = 7;
const MAX_TAGS: usize = 10;

pub fn format_story(markup: Markup, story: &ProcessedStory, index: usize) -> String {
    let mut out = format!(
        "{index}. {}\n🏆 {} points | 💬 {} comments",
        markup.link(&story.title, &story.url),
        story.score,
        story.comment_count
    );
    if !story.keywords.is_empty() {
        let tags: Vec<&str> = story.keywords.iter().take(MAX_TAGS).map(String::as_str).collect();
        out.push_str("\n🏷️ ");
        out.push_str(&markup.escape(&tags.join(", ")));
    }
    out
}

/// Scheduled digest. Stories are re-sorted by score, highest first.
pub fn format_daily_digest(markup: Markup, stories: &[ProcessedStory], date: NaiveDate) -> String {
    let title = markup.bold("Hacker News Daily Digest");
    if stories.is_empty() {
        return format!("📰 {title}\n\nNo new top stories today.");
    }

    let mut sorted: Vec<&ProcessedStory> = stories.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));

    let header = format!(
        "📰 {title}\n📅 {}\n\n",
        markup.escape(&date.format("%A, %B %-d, %Y").to_string())
    );
    let blocks: Vec<String> = sorted
        .iter()
        .enumerate()
        .map(|(i, s)| format_story(markup, s, i + 1))
        .collect();
    let notice = markup.italic(&format!(
        "(Message truncated due to length. Showing top {DIGEST_KEEP} stories.)"
    ));
    render_blocks(&header, &blocks, DIGEST_KEEP, &notice)
}

/// Ranking page `start..=end`. Stories keep the ranking order they arrive
/// in and are numbered from `start`.
pub fn format_stories_range(
    markup: Markup,
    stories: &[ProcessedStory],
    start: usize,
    end: usize,
) -> String {
    let header = format!("📰 {}\n\n", markup.bold(&format!("Hacker News Top {start}-{end}")));
    if stories.is_empty() {
        return format!("{header}No stories found.");
    }
    let blocks: Vec<String> = stories
        .iter()
        .enumerate()
        .map(|(i, s)| format_story(markup, s, start + i))
        .collect();
    let notice = markup.italic("(Message truncated due to length.)");
    render_blocks(&header, &blocks, RANGE_KEEP, &notice)
}
