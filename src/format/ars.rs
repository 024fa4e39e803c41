// src/format/ars.rs
use super::{render_blocks, Markup};
use crate::ingest::types::Article;

pub const ARS_KEEP: usize = 7;

pub fn format_article(markup: Markup, article: &Article, index: usize) -> String {
    let mut out = format!("{index}. {}", markup.link(&article.title, &article.url));
    let byline = match article.published_at.as_str() {
        "" => article.author.clone(),
        date => format!("{} | {date}", article.author),
    };
    out.push_str("\n✍️ ");
    out.push_str(&markup.escape(&byline));
    if !article.excerpt.is_empty() {
        out.push('\n');
        out.push_str(&markup.italic(&article.excerpt));
    }
    out
}

/// Feed order is kept.
pub fn format_ars_articles(markup: Markup, articles: &[Article]) -> String {
    let header = format!("🔬 {}\n\n", markup.bold("Ars Technica Top Stories"));
    if articles.is_empty() {
        return format!("{header}No articles found.");
    }
    let blocks: Vec<String> = articles
        .iter()
        .enumerate()
        .map(|(i, a)| format_article(markup, a, i + 1))
        .collect();
    let notice = markup.italic(&format!(
        "(Message truncated due to length. Showing top {ARS_KEEP} articles.)"
    ));
    render_blocks(&header, &blocks, ARS_KEEP, &notice)
}
