// src/format/rates.rs
use super::{group_thousands, Markup};
use crate::ingest::types::ExchangeRates;

fn flag(code: &str) -> &'static str {
    match code {
        "PHP" => "🇵🇭",
        "MYR" => "🇲🇾",
        "TWD" => "🇹🇼",
        "HKD" => "🇭🇰",
        "CNY" => "🇨🇳",
        "THB" => "🇹🇭",
        "VND" => "🇻🇳",
        _ => "💱",
    }
}

fn fmt_rate(value: f64) -> String {
    if value >= 1000.0 {
        group_thousands(value, 2)
    } else {
        format!("{value:.2}")
    }
}

pub fn format_exchange_rates(markup: Markup, rates: &ExchangeRates) -> String {
    let lines: Vec<String> = rates
        .rates
        .iter()
        .map(|q| format!("{} {}: {}", flag(&q.code), q.code, fmt_rate(q.value)))
        .collect();
    let mut out = format!(
        "🇺🇸 {} (1 USD)\n\n{}",
        markup.bold("Exchange Rates"),
        lines.join("\n")
    );
    if let Some(updated) = &rates.updated_at {
        out.push_str("\n\nUpdated: ");
        out.push_str(&markup.escape(updated));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::RateQuote;

    #[test]
    fn one_line_per_currency_with_update_stamp() {
        let rates = ExchangeRates {
            rates: vec![
                RateQuote { code: "PHP".into(), value: 56.123 },
                RateQuote { code: "VND".into(), value: 25345.5 },
            ],
            updated_at: Some("2024-03-05 23:59 UTC".into()),
        };
        assert_eq!(
            format_exchange_rates(Markup::Markdown, &rates),
            "🇺🇸 *Exchange Rates* (1 USD)\n\n🇵🇭 PHP: 56.12\n🇻🇳 VND: 25,345.50\n\nUpdated: 2024-03-05 23:59 UTC"
        );
    }

    #[test]
    fn no_stamp_line_without_timestamp() {
        let rates = ExchangeRates {
            rates: vec![RateQuote { code: "THB".into(), value: 35.9 }],
            updated_at: None,
        };
        assert!(!format_exchange_rates(Markup::Html, &rates).contains("Updated"));
    }
}
