// src/format/prices.rs
use super::{clamp_to_ceiling, group_thousands, Markup};
use crate::ingest::types::PriceTick;

pub const PRICES_UNAVAILABLE: &str = "❌ Failed to fetch prices, please try again later.";

/// `>= 1000` grouped, `>= 1` two decimals, otherwise four.
pub fn fmt_price(price: f64) -> String {
    if price >= 1000.0 {
        group_thousands(price, 2)
    } else if price >= 1.0 {
        format!("{price:.2}")
    } else {
        format!("{price:.4}")
    }
}

pub fn fmt_change_marker(change: f64) -> String {
    if change >= 0.0 {
        format!("🟢 +{change:.2}%")
    } else {
        format!("🔴 {change:.2}%")
    }
}

pub fn format_crypto_prices(markup: Markup, ticks: &[PriceTick]) -> String {
    if ticks.is_empty() {
        return PRICES_UNAVAILABLE.to_string();
    }
    let width = ticks.iter().map(|t| t.symbol.chars().count()).max().unwrap_or(0);
    let lines: Vec<String> = ticks
        .iter()
        .map(|t| {
            let price = format!("${}", fmt_price(t.price));
            format!(
                "{:<width$}: {:>12} {}",
                markup.escape(&t.symbol),
                price,
                fmt_change_marker(t.change_24h)
            )
        })
        .collect();
    let msg = format!("📊 {}\n\n{}", markup.bold("Crypto Prices"), lines.join("\n"));
    clamp_to_ceiling(msg, &markup.italic("(truncated)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(symbol: &str, price: f64, change: f64) -> PriceTick {
        PriceTick {
            symbol: symbol.into(),
            price,
            change_24h: change,
        }
    }

    #[test]
    fn price_precision_tiers() {
        assert_eq!(fmt_price(67123.456), "67,123.46");
        assert_eq!(fmt_price(154.2), "154.20");
        assert_eq!(fmt_price(0.12345), "0.1235");
    }

    #[test]
    fn board_aligns_symbols_and_marks_direction() {
        let out = format_crypto_prices(
            Markup::Markdown,
            &[tick("BTC", 67000.0, 1.5), tick("LINK", 14.2, -2.25)],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "📊 *Crypto Prices*");
        assert_eq!(lines[2], "BTC :   $67,000.00 🟢 +1.50%");
        assert_eq!(lines[3], "LINK:       $14.20 🔴 -2.25%");
    }

    #[test]
    fn empty_board_is_failure_notice() {
        assert_eq!(format_crypto_prices(Markup::Html, &[]), PRICES_UNAVAILABLE);
    }
}
