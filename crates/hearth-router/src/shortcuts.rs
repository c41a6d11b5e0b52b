//! Keyword shortcuts that route common requests straight to a tool.
//!
//! Categories are checked in a fixed priority order: time, light, switch,
//! ping. The first category whose keyword set intersects the lowercased
//! message claims it; later categories are never consulted. A control
//! category that matches without an action phrase yields no plan, which
//! sends the message down the generation path instead.

use hearth_tools::{ControlAction, names};
use serde_json::{Value, json};

pub const TIME_KEYWORDS: &[&str] = &[
    "time",
    "date",
    "current time",
    "what time",
    "when is it",
    "ntp",
];
pub const LIGHT_KEYWORDS: &[&str] = &["light", "lights", "lamp", "brightness", "dim", "bright"];
pub const SWITCH_KEYWORDS: &[&str] = &["switch", "outlet", "plug", "fan", "coffee"];
pub const PING_KEYWORDS: &[&str] = &["ping", "connectivity", "connect", "reach", "test"];

/// Action phrases in match order. Longest first, so "turn off" is claimed
/// before the bare "off" token gets a chance.
const ACTION_PHRASES: &[(&str, ControlAction)] = &[
    ("turn on", ControlAction::TurnOn),
    ("turn off", ControlAction::TurnOff),
    ("toggle", ControlAction::Toggle),
    ("on", ControlAction::TurnOn),
    ("off", ControlAction::TurnOff),
];

/// A tool call planned from keyword routing, with everything the debug
/// trace wants to show about how it was derived.
#[derive(Debug, Clone)]
pub struct ShortcutPlan {
    pub tool_name: &'static str,
    pub arguments: Value,
    pub pattern: &'static str,
    pub keywords: Vec<&'static str>,
    pub params: Value,
}

/// Match `message` against the shortcut tables.
pub fn plan(message: &str, default_ping_host: &str) -> Option<ShortcutPlan> {
    let lower = message.to_lowercase();

    let hits = detected(&lower, TIME_KEYWORDS);
    if !hits.is_empty() {
        return Some(ShortcutPlan {
            tool_name: names::NETWORK_TIME,
            arguments: json!({}),
            pattern: "time_query",
            keywords: hits,
            params: json!({ "query_type": "current_time" }),
        });
    }

    let hits = detected(&lower, LIGHT_KEYWORDS);
    if !hits.is_empty() {
        return control_plan(
            &lower,
            hits,
            names::CONTROL_LIGHT,
            &["lights", "light"],
            "light_control",
        );
    }

    let hits = detected(&lower, SWITCH_KEYWORDS);
    if !hits.is_empty() {
        return control_plan(
            &lower,
            hits,
            names::CONTROL_SWITCH,
            &["switches", "switch"],
            "switch_control",
        );
    }

    let hits = detected(&lower, PING_KEYWORDS);
    if !hits.is_empty() {
        return Some(ping_plan(message, hits, default_ping_host));
    }

    None
}

fn detected<'a>(lower: &str, keywords: &'a [&'a str]) -> Vec<&'a str> {
    keywords
        .iter()
        .copied()
        .filter(|kw| lower.contains(kw))
        .collect()
}

/// Message tokens with leading/trailing punctuation removed. Interior
/// characters such as apostrophes survive.
fn words(lower: &str) -> Vec<&str> {
    lower
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// First action phrase whose words appear consecutively in the message.
/// Token-wise matching keeps "on" from firing inside words like "monitor".
fn detect_action(tokens: &[&str]) -> Option<(&'static str, ControlAction)> {
    for (phrase, action) in ACTION_PHRASES {
        let phrase_words: Vec<&str> = phrase.split_whitespace().collect();
        let present = tokens
            .windows(phrase_words.len())
            .any(|w| w == phrase_words.as_slice());
        if present {
            return Some((phrase, *action));
        }
    }
    None
}

/// Whatever remains after stripping the matched action phrase, "the", and
/// the domain word is the name filter. Nothing left means no filter.
fn extract_target(tokens: &[&str], matched_phrase: &str, domain_words: &[&str]) -> Option<String> {
    let phrase_words: Vec<&str> = matched_phrase.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let end = i + phrase_words.len();
        if end <= tokens.len() && tokens[i..end] == phrase_words[..] {
            i = end;
            continue;
        }
        let token = tokens[i];
        i += 1;
        if token == "the" || domain_words.contains(&token) {
            continue;
        }
        kept.push(token);
    }

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

fn control_plan(
    lower: &str,
    keywords: Vec<&'static str>,
    tool_name: &'static str,
    domain_words: &[&str],
    pattern: &'static str,
) -> Option<ShortcutPlan> {
    let tokens = words(lower);
    let (phrase, action) = detect_action(&tokens)?;
    let filter = extract_target(&tokens, phrase, domain_words);
    let target_label = filter.as_deref().unwrap_or("(all matching)").to_string();

    Some(ShortcutPlan {
        tool_name,
        arguments: json!({ "action": action.service(), "name_filter": filter }),
        pattern,
        keywords,
        params: json!({
            "action_phrase": phrase,
            "action": action.service(),
            "target_name": target_label,
        }),
    })
}

/// The hostname is the first whitespace token containing a dot that is not
/// a URL and is long enough to be plausible; otherwise the configured
/// fallback host. Scans the original-case message so the hostname keeps
/// its casing.
fn ping_plan(message: &str, keywords: Vec<&'static str>, default_host: &str) -> ShortcutPlan {
    let mut hostname = default_host.to_string();
    let mut extracted = None;

    for word in message.split_whitespace() {
        if word.contains('.') && !word.starts_with("http") && word.len() > 3 {
            hostname = word
                .trim_matches(|c| matches!(c, '.' | ',' | '!' | '?'))
                .to_string();
            extracted = Some(word.to_string());
            break;
        }
    }

    let origin = extracted.unwrap_or_else(|| format!("(default: {})", default_host));
    ShortcutPlan {
        tool_name: names::PING_HOST,
        arguments: json!({ "hostname": hostname }),
        pattern: "ping_query",
        keywords,
        params: json!({
            "hostname": hostname,
            "extracted_from_message": origin,
        }),
    }
}
