// src/format/brief.rs
//! The ETH brief: one section per data branch, each with its own failure line.

use chrono::{DateTime, Utc};

use super::{clamp_to_ceiling, fmt_change, fmt_usd, Markup};
use crate::ingest::types::{AssetQuote, BriefSnapshot};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn price_line(markup: Markup, label: &str, q: &AssetQuote) -> String {
    let mut line = format!(
        "  {label}  {}  {}",
        markup.bold(&fmt_usd(q.price)),
        fmt_change(q.change_24h)
    );
    if q.market_cap > 0.0 {
        line.push_str(&format!("  MCap {}", fmt_usd(q.market_cap)));
    }
    line
}

pub fn format_eth_brief(markup: Markup, snap: &BriefSnapshot, now: DateTime<Utc>) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "🔷 {}",
        markup.bold(&format!("ETH Daily Brief | {}", now.format("%Y-%m-%d %H:%M UTC")))
    ));
    lines.push(RULE.to_string());

    lines.push(format!("💰 {}", markup.bold("Prices")));
    match &snap.prices {
        Some(p) => {
            lines.push(price_line(markup, "ETH", &p.eth));
            lines.push(price_line(markup, "BTC", &p.btc));
        }
        None => lines.push("  ❌ Price data unavailable".into()),
    }

    lines.push(format!("📊 {}", markup.bold("DeFi TVL (DeFiLlama)")));
    match &snap.tvl {
        Some(t) => {
            lines.push(format!("  Ethereum  {}", markup.bold(&fmt_usd(t.ethereum))));
            lines.push(format!("  All chains  {}", markup.bold(&fmt_usd(t.total))));
        }
        None => lines.push("  ❌ TVL data unavailable".into()),
    }

    lines.push(format!(
        "🏆 {}",
        markup.bold(&format!("ETH Top {} Protocols by TVL", crate::ingest::brief::TOP_PROTOCOLS))
    ));
    if snap.protocols.is_empty() {
        lines.push("  ❌ Protocol data unavailable".into());
    }
    for (i, p) in snap.protocols.iter().enumerate() {
        lines.push(format!(
            "  {}. {:<22}{:<10}{}",
            i + 1,
            markup.escape(&p.name),
            fmt_usd(p.tvl),
            fmt_change(p.change_1d)
        ));
    }

    lines.push(format!(
        "💵 {}",
        markup.bold(&format!("ETH Stablecoins (Top {})", crate::ingest::brief::TOP_STABLECOINS))
    ));
    if snap.stablecoins.is_empty() {
        lines.push("  ❌ Stablecoin data unavailable".into());
    }
    for s in &snap.stablecoins {
        lines.push(format!(
            "  {:<8} {}",
            markup.escape(&s.symbol),
            markup.bold(&fmt_usd(s.circulating))
        ));
    }

    lines.push(format!("🔄 {}", markup.bold("ETH DEX Volume")));
    match &snap.dex {
        Some(d) => {
            lines.push(format!(
                "  24h total  {}    7d total  {}",
                markup.bold(&fmt_usd(d.total_24h)),
                markup.bold(&fmt_usd(d.total_7d))
            ));
            lines.push(format!("  ── Top {} ──", d.top.len()));
            for (i, v) in d.top.iter().enumerate() {
                lines.push(format!(
                    "  {}. {:<22}{}",
                    i + 1,
                    markup.escape(&v.name),
                    markup.bold(&fmt_usd(v.volume_24h))
                ));
            }
        }
        None => lines.push("  ❌ DEX data unavailable".into()),
    }

    lines.push(RULE.to_string());
    lines.push("Data: Coinbase + CoinGecko + DeFiLlama".into());
    clamp_to_ceiling(lines.join("\n"), &markup.italic("(truncated)"))
}
