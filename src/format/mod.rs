// src/format/mod.rs
//! Message rendering. Every formatter renders through one [`Markup`] chosen
//! per deployment and respects the transport ceiling.

pub mod ars;
pub mod brief;
pub mod hn;
pub mod prices;
pub mod rates;

use serde::Deserialize;

/// Hard transport limit, in UTF-16 code units (what the bot API counts).
pub const MESSAGE_CEILING: usize = 4096;
/// Rendered size above which a formatter switches to its reduced prefix.
pub const TRUNCATE_THRESHOLD: usize = 4000;

/// Displayed length as counted by the transport.
pub fn display_len(s: &str) -> usize {
    s.encode_utf16().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Markup {
    /// Legacy Markdown with backslash escapes.
    #[default]
    Markdown,
    /// HTML with entity escapes.
    Html,
}

impl std::str::FromStr for Markup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Markup::Markdown),
            "html" => Ok(Markup::Html),
            other => Err(format!("unknown parse mode `{other}` (expected markdown|html)")),
        }
    }
}

impl Markup {
    /// Value of the bot API `parse_mode` field.
    pub fn parse_mode(self) -> &'static str {
        match self {
            Markup::Markdown => "Markdown",
            Markup::Html => "HTML",
        }
    }

    pub fn escape(self, text: &str) -> String {
        match self {
            Markup::Markdown => {
                let mut out = String::with_capacity(text.len());
                for c in text.chars() {
                    if matches!(c, '[' | ']' | '(' | ')' | '_' | '*' | '`') {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out
            }
            Markup::Html => html_escape::encode_text(text).into_owned(),
        }
    }

    pub fn bold(self, text: &str) -> String {
        match self {
            Markup::Markdown => format!("*{}*", self.escape(text)),
            Markup::Html => format!("<b>{}</b>", self.escape(text)),
        }
    }

    pub fn italic(self, text: &str) -> String {
        match self {
            Markup::Markdown => format!("_{}_", self.escape(text)),
            Markup::Html => format!("<i>{}</i>", self.escape(text)),
        }
    }

    pub fn link(self, label: &str, url: &str) -> String {
        match self {
            Markup::Markdown => {
                let url = url.replace(' ', "%20").replace(')', "%29");
                format!("[{}]({})", self.escape(label), url)
            }
            Markup::Html => format!(
                "<a href=\"{}\">{}</a>",
                html_escape::encode_double_quoted_attribute(url),
                self.escape(label)
            ),
        }
    }
}

/// Join `header + blocks`, falling back to the first `keep` blocks plus a
/// visible notice when the full rendering exceeds [`TRUNCATE_THRESHOLD`].
/// The result never exceeds [`MESSAGE_CEILING`].
pub fn render_blocks(header: &str, blocks: &[String], keep: usize, notice: &str) -> String {
    let full = join_blocks(header, blocks);
    if display_len(&full) <= TRUNCATE_THRESHOLD {
        return full;
    }

    let mut n = keep.min(blocks.len()).max(1);
    loop {
        let mut msg = join_blocks(header, &blocks[..n.min(blocks.len())]);
        msg.push_str("\n\n");
        msg.push_str(notice);
        if display_len(&msg) <= MESSAGE_CEILING || n == 1 {
            return clamp_to_ceiling(msg, notice);
        }
        n -= 1;
    }
}

fn join_blocks(header: &str, blocks: &[String]) -> String {
    let mut out = String::from(header);
    out.push_str(&blocks.join("\n\n"));
    out
}

/// Last-resort guard: cut back to the last line break that fits and
/// re-append `notice`. Links and tags never span lines, so the kept text stays
/// parseable. A single oversized line is cut on a char boundary.
pub fn clamp_to_ceiling(msg: String, notice: &str) -> String {
    if display_len(&msg) <= MESSAGE_CEILING {
        return msg;
    }
    let budget = MESSAGE_CEILING.saturating_sub(display_len(notice) + 2);
    let cut = prefix_within(&msg, budget);
    let head = match cut.rfind('\n') {
        Some(i) if i > 0 => cut[..i].trim_end(),
        _ => cut,
    };

    let mut out = String::with_capacity(head.len() + notice.len() + 2);
    out.push_str(head);
    out.push_str("\n\n");
    out.push_str(notice);
    if display_len(&out) > MESSAGE_CEILING {
        // notice alone is oversized; keep the plain cut
        return prefix_within(&out, MESSAGE_CEILING).to_string();
    }
    out
}

/// Longest prefix of `s` that fits in `budget` UTF-16 units.
fn prefix_within(s: &str, budget: usize) -> &str {
    let mut used = 0usize;
    for (idx, c) in s.char_indices() {
        used += c.len_utf16();
        if used > budget {
            return &s[..idx];
        }
    }
    s
}

/// `1234567.891` -> `1,234,567.89`
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value.abs());
    let (int, frac) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if value < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Compact dollars: `$1.23T`, `$4.56B`, `$7.89M`, else `$12.34`.
pub fn fmt_usd(value: f64) -> String {
    if value >= 1e12 {
        format!("${:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("${:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.2}M", value / 1e6)
    } else {
        format!("${value:.2}")
    }
}

/// `▲1.2%` / `▼3.4%`
pub fn fmt_change(pct: f64) -> String {
    let arrow = if pct >= 0.0 { '▲' } else { '▼' };
    format!("{arrow}{:.1}%", pct.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_escapes_markup_chars() {
        assert_eq!(
            Markup::Markdown.escape("a_b *c* [d](e) `f`"),
            r"a\_b \*c\* \[d\]\(e\) \`f\`"
        );
    }

    #[test]
    fn html_escapes_entities() {
        assert_eq!(Markup::Html.escape("<a & b>"), "&lt;a &amp; b&gt;");
        assert_eq!(
            Markup::Html.link("x<y", "https://e.com/?a=1&b=\"2\""),
            "<a href=\"https://e.com/?a=1&amp;b=&quot;2&quot;\">x&lt;y</a>"
        );
    }

    #[test]
    fn markdown_link_keeps_url_parseable() {
        assert_eq!(
            Markup::Markdown.link("Wiki (disambiguation)", "https://en.wikipedia.org/wiki/X_(y)"),
            r"[Wiki \(disambiguation\)](https://en.wikipedia.org/wiki/X_(y%29)"
        );
    }

    #[test]
    fn parse_mode_roundtrip_from_config_strings() {
        assert_eq!("HTML".parse::<Markup>().unwrap(), Markup::Html);
        assert_eq!("markdown".parse::<Markup>().unwrap().parse_mode(), "Markdown");
        assert!("bbcode".parse::<Markup>().is_err());
    }

    #[test]
    fn display_len_counts_utf16_units() {
        assert_eq!(display_len("abc"), 3);
        assert_eq!(display_len("📰"), 2);
    }

    #[test]
    fn small_lists_render_in_full() {
        let blocks = vec!["one".to_string(), "two".to_string()];
        assert_eq!(render_blocks("H\n\n", &blocks, 1, "(truncated)"), "H\n\none\n\ntwo");
    }

    #[test]
    fn oversized_lists_keep_prefix_and_notice() {
        let blocks: Vec<String> = (0..50).map(|i| format!("{i}. {}", "x".repeat(200))).collect();
        let out = render_blocks("H\n\n", &blocks, 5, "(truncated)");
        assert!(display_len(&out) <= MESSAGE_CEILING);
        assert!(out.ends_with("(truncated)"));
        assert!(out.contains("4. "));
        assert!(!out.contains("5. x"));
    }

    #[test]
    fn prefix_shrinks_until_it_fits() {
        let blocks: Vec<String> = (0..10).map(|i| format!("{i}:{}", "y".repeat(1500))).collect();
        let out = render_blocks("", &blocks, 7, "(truncated)");
        assert!(display_len(&out) <= MESSAGE_CEILING);
        assert!(out.contains("0:") && out.contains("1:"));
        assert!(!out.contains("2:"));
    }

    #[test]
    fn single_giant_block_is_clamped() {
        let blocks = vec!["z".repeat(10_000)];
        let out = render_blocks("", &blocks, 5, "(truncated)");
        assert!(display_len(&out) <= MESSAGE_CEILING);
        assert!(out.ends_with("(truncated)"));
    }

    #[test]
    fn clamp_cuts_at_a_line_break_so_links_stay_whole() {
        let lines: Vec<String> = (0..200)
            .map(|i| Markup::Markdown.link(&format!("Story {i}"), &format!("https://e.com/{i}")))
            .collect();
        let notice = Markup::Markdown.italic("(truncated)");
        let out = clamp_to_ceiling(lines.join("\n"), &notice);

        assert!(display_len(&out) <= MESSAGE_CEILING);
        let body = out.strip_suffix(&notice).unwrap().trim_end();
        assert!(body.lines().all(|l| l.starts_with("[Story ") && l.ends_with(')')), "{body}");
    }

    #[test]
    fn clamp_keeps_html_tags_balanced() {
        let lines: Vec<String> = (0..300)
            .map(|i| format!("{i}. {}", Markup::Html.bold(&format!("item <{i}>"))))
            .collect();
        let out = clamp_to_ceiling(lines.join("\n"), "<i>(truncated)</i>");
        assert!(display_len(&out) <= MESSAGE_CEILING);
        assert_eq!(out.matches("<b>").count(), out.matches("</b>").count());
        assert!(out.ends_with("\n\n<i>(truncated)</i>"));
    }

    #[test]
    fn clamp_counts_astral_chars_as_two_units() {
        let out = clamp_to_ceiling("📈".repeat(3000), "(truncated)");
        assert!(display_len(&out) <= MESSAGE_CEILING);
        assert!(out.ends_with("(truncated)"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(999.5, 2), "999.50");
        assert_eq!(group_thousands(1000.0, 0), "1,000");
        assert_eq!(group_thousands(-26345.5, 2), "-26,345.50");
    }

    #[test]
    fn compact_usd_and_change() {
        assert_eq!(fmt_usd(2.5e12), "$2.50T");
        assert_eq!(fmt_usd(61.234e9), "$61.23B");
        assert_eq!(fmt_usd(7.891e6), "$7.89M");
        assert_eq!(fmt_usd(3500.0), "$3500.00");
        assert_eq!(fmt_change(1.26), "▲1.3%");
        assert_eq!(fmt_change(-0.04), "▼0.0%");
    }
}
