//! Parsing of `USE_TOOL:<name>:<json>` directives out of generated text.
//!
//! Models do not always emit clean JSON, so argument parsing carries the
//! recovery rules the generation prompt trained against: placeholder
//! argument strings collapse to an empty object, and a mangled string that
//! still mentions a hostname gives up everything but the quoted value.

use serde_json::{Value, json};

pub const DIRECTIVE_MARKER: &str = "USE_TOOL:";

/// A tool call requested by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDirective {
    pub tool_name: String,
    pub arguments: Value,
}

/// Scan generated text for the first line carrying a directive.
///
/// `None` means the text is a plain conversational answer.
pub fn parse_directive(text: &str) -> Option<ToolDirective> {
    let line = text.lines().find(|line| line.contains(DIRECTIVE_MARKER))?;
    let (_, tail) = line.split_once(DIRECTIVE_MARKER)?;

    match tail.split_once(':') {
        Some((name, raw)) => Some(ToolDirective {
            tool_name: name.trim().to_string(),
            arguments: parse_arguments(raw.trim()),
        }),
        None => Some(ToolDirective {
            tool_name: tail.trim().to_string(),
            arguments: json!({}),
        }),
    }
}

fn parse_arguments(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str(raw) {
        return value;
    }

    if raw.is_empty() || raw == "{}" || raw == "{timestamp}" {
        return json!({});
    }

    if raw.contains("hostname") {
        // Take the first quoted substring as the hostname.
        let mut pieces = raw.split('"');
        pieces.next();
        if let Some(hostname) = pieces.next() {
            return json!({ "hostname": hostname });
        }
    }

    json!({})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_directive() {
        let text = "USE_TOOL:ping_host:{\"hostname\": \"example.com\"}";
        let directive = parse_directive(text).unwrap();
        assert_eq!(directive.tool_name, "ping_host");
        assert_eq!(directive.arguments, json!({ "hostname": "example.com" }));
    }

    #[test]
    fn test_directive_mid_line_and_mid_text() {
        let text = "Let me check that for you.\nI will USE_TOOL:get_network_time:{}\nOne moment.";
        let directive = parse_directive(text).unwrap();
        assert_eq!(directive.tool_name, "get_network_time");
        assert_eq!(directive.arguments, json!({}));
    }

    #[test]
    fn test_first_directive_line_wins() {
        let text = "USE_TOOL:get_network_time:{}\nUSE_TOOL:ping_host:{\"hostname\": \"a.com\"}";
        let directive = parse_directive(text).unwrap();
        assert_eq!(directive.tool_name, "get_network_time");
    }

    #[test]
    fn test_placeholder_arguments_collapse() {
        let directive = parse_directive("USE_TOOL:get_network_time:{timestamp}").unwrap();
        assert_eq!(directive.arguments, json!({}));
    }

    #[test]
    fn test_bare_name_without_arguments() {
        let directive = parse_directive("USE_TOOL:get_network_time").unwrap();
        assert_eq!(directive.tool_name, "get_network_time");
        assert_eq!(directive.arguments, json!({}));
    }

    #[test]
    fn test_hostname_recovered_from_broken_json() {
        let directive = parse_directive("USE_TOOL:ping_host:{hostname: \"example.com\"}").unwrap();
        assert_eq!(directive.arguments, json!({ "hostname": "example.com" }));
    }

    #[test]
    fn test_unrecoverable_arguments_default_empty() {
        let directive = parse_directive("USE_TOOL:ha_control_light:{action: turn_on}").unwrap();
        assert_eq!(directive.tool_name, "ha_control_light");
        assert_eq!(directive.arguments, json!({}));
    }

    #[test]
    fn test_no_directive_means_conversational() {
        assert!(parse_directive("The capital of France is Paris.").is_none());
    }
}
