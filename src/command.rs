// src/command.rs
//! Inbound chat updates and the static command table.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Offsets and lengths are in UTF-16 code units.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased, `@botname` stripped, leading `/` kept.
    pub name: String,
    pub chat_id: i64,
    /// Text after the command span, trimmed.
    pub args: String,
}

/// Byte index of the UTF-16 offset `units` in `s`, if it lands on a char boundary.
fn utf16_to_byte(s: &str, units: usize) -> Option<usize> {
    let mut seen = 0usize;
    for (idx, c) in s.char_indices() {
        if seen == units {
            return Some(idx);
        }
        seen += c.len_utf16();
        if seen > units {
            return None;
        }
    }
    (seen == units).then_some(s.len())
}

/// First `bot_command` entity of the message, or `None` (caller does nothing).
pub fn parse_command(update: &Update) -> Option<ParsedCommand> {
    let msg = update.message.as_ref()?;
    let text = msg.text.as_deref()?;
    let entity = msg.entities.iter().find(|e| e.kind == "bot_command")?;

    let start = utf16_to_byte(text, entity.offset)?;
    let end = utf16_to_byte(text, entity.offset.checked_add(entity.length)?)?;
    let raw = text.get(start..end)?;
    let name = raw.split('@').next().unwrap_or(raw).to_lowercase();
    if !name.starts_with('/') {
        return None;
    }

    Some(ParsedCommand {
        name,
        chat_id: msg.chat.id,
        args: text[end..].trim().to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Hacker News ranking `start..=end`, 1-based.
    HnRange { start: usize, end: usize },
    ArsTop,
    Prices,
    ExchangeRates,
    EthBrief,
    FlushCache,
    Help,
}

pub const COMMANDS: &[(&str, Action)] = &[
    ("/top10hn", Action::HnRange { start: 1, end: 10 }),
    ("/top20hn", Action::HnRange { start: 11, end: 20 }),
    ("/top10ars", Action::ArsTop),
    ("/btc", Action::Prices),
    ("/crypto", Action::Prices),
    ("/exrate", Action::ExchangeRates),
    ("/eth", Action::EthBrief),
    ("/flushcache", Action::FlushCache),
    ("/start", Action::Help),
    ("/help", Action::Help),
];

/// Unknown names resolve to `None` and are ignored.
pub fn resolve(name: &str) -> Option<Action> {
    COMMANDS.iter().find(|(n, _)| *n == name).map(|(_, a)| *a)
}

pub fn help_text() -> String {
    let mut out = String::from("Available commands:\n");
    out.push_str("/top10hn - Hacker News top 1-10\n");
    out.push_str("/top20hn - Hacker News top 11-20\n");
    out.push_str("/top10ars - Ars Technica latest\n");
    out.push_str("/btc, /crypto - crypto prices\n");
    out.push_str("/exrate - USD exchange rates\n");
    out.push_str("/eth - ETH and DeFi brief\n");
    out.push_str("/flushcache - clear cached data\n");
    out.push_str("/help - this message");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(text: &str, entities: serde_json::Value) -> Update {
        serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": { "chat": { "id": -100123 }, "text": text, "entities": entities }
        }))
        .unwrap()
    }

    #[test]
    fn strips_bot_suffix_and_lowercases() {
        let u = update(
            "/Top10HN@mybot extra text",
            serde_json::json!([{ "type": "bot_command", "offset": 0, "length": 14 }]),
        );
        let cmd = parse_command(&u).unwrap();
        assert_eq!(cmd.name, "/top10hn");
        assert_eq!(cmd.chat_id, -100123);
        assert_eq!(cmd.args, "extra text");
    }

    #[test]
    fn no_command_entity_is_no_match() {
        let u = update("hello /top10hn", serde_json::json!([{ "type": "bold", "offset": 0, "length": 5 }]));
        assert!(parse_command(&u).is_none());
        let u: Update = serde_json::from_str(r#"{"update_id":2}"#).unwrap();
        assert!(parse_command(&u).is_none());
    }

    #[test]
    fn first_command_entity_wins() {
        let u = update(
            "/btc /eth",
            serde_json::json!([
                { "type": "bot_command", "offset": 0, "length": 4 },
                { "type": "bot_command", "offset": 5, "length": 4 }
            ]),
        );
        assert_eq!(parse_command(&u).unwrap().name, "/btc");
    }

    #[test]
    fn offsets_are_utf16_units() {
        // "📰 " is three UTF-16 units and five bytes
        let u = update(
            "📰 /eth",
            serde_json::json!([{ "type": "bot_command", "offset": 3, "length": 4 }]),
        );
        assert_eq!(parse_command(&u).unwrap().name, "/eth");
    }

    #[test]
    fn out_of_range_entity_is_ignored() {
        let u = update("/btc", serde_json::json!([{ "type": "bot_command", "offset": 0, "length": 40 }]));
        assert!(parse_command(&u).is_none());
    }

    #[test]
    fn overflowing_entity_span_is_not_a_command() {
        let u = update(
            "/btc",
            serde_json::json!([{ "type": "bot_command", "offset": 1, "length": u64::MAX }]),
        );
        assert!(parse_command(&u).is_none());
    }

    #[test]
    fn table_resolution() {
        assert_eq!(resolve("/top20hn"), Some(Action::HnRange { start: 11, end: 20 }));
        assert_eq!(resolve("/crypto"), resolve("/btc"));
        assert_eq!(resolve("/weather"), None);
        assert!(COMMANDS.iter().all(|(n, _)| help_text().contains(n) || *n == "/start"));
    }
}
