//! Wire types shared by the chat and tools services.
//!
//! Tool execution always answers with the uniform [`ToolCallResponse`]
//! envelope: callers can rely on `status` plus a non-null `result_data`
//! regardless of whether the tool succeeded, failed validation, or hit an
//! unreachable upstream. Transport-level errors are reserved for malformed
//! requests at the protocol boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// Session used when a request carries none.
pub const DEFAULT_SESSION: &str = "default";

fn default_session() -> String {
    DEFAULT_SESSION.to_string()
}

// ============================================================================
// Tool execution protocol
// ============================================================================

/// Outcome of a tool execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Request to execute one tool by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    /// Free-form argument mapping, validated per tool at the registry.
    #[serde(default)]
    pub arguments: Value,
    #[serde(default = "default_session")]
    pub session_id: String,
}

impl ToolCallRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            session_id: default_session(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }
}

/// Uniform success/error envelope produced by every execution path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub status: ToolStatus,
    pub result_data: Value,
}

impl ToolCallResponse {
    pub fn success(result_data: Value) -> Self {
        Self {
            status: ToolStatus::Success,
            result_data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            result_data: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Error text, when this is an error envelope.
    pub fn error_message(&self) -> Option<&str> {
        match self.status {
            ToolStatus::Success => None,
            ToolStatus::Error => self.result_data.get("error").and_then(Value::as_str),
        }
    }
}

// ============================================================================
// Chat protocol
// ============================================================================

/// How a chat message was resolved. Derived per exchange, never stored on
/// its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingKind {
    /// Keyword shortcut called the tool directly, no engine involved.
    DirectShortcut,
    /// The engine emitted a tool directive and a synthesis call followed.
    LlmWithTools,
    /// Plain conversational answer.
    LlmOnly,
}

impl RoutingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingKind::DirectShortcut => "direct_shortcut",
            RoutingKind::LlmWithTools => "llm_with_tools",
            RoutingKind::LlmOnly => "llm_only",
        }
    }
}

/// Incoming chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session")]
    pub session_id: String,
}

/// Completed chat exchange as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub tools_used: Vec<String>,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub interaction_id: String,
    pub routing: RoutingKind,
    /// Routing trace for observability; shape varies by routing kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

// ============================================================================
// Feedback protocol
// ============================================================================

/// The two accepted feedback values. Anything else is rejected at the
/// boundary before any store is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    ThumbsUp,
    ThumbsDown,
}

impl Feedback {
    /// Strict parse; no aliases, no case folding.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "thumbs_up" => Some(Feedback::ThumbsUp),
            "thumbs_down" => Some(Feedback::ThumbsDown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::ThumbsUp => "thumbs_up",
            Feedback::ThumbsDown => "thumbs_down",
        }
    }
}

/// Feedback submission for a previously returned interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub interaction_id: String,
    #[serde(default = "default_session")]
    pub session_id: String,
    /// Raw value; validated against [`Feedback::parse`].
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub status: String,
    pub message: String,
}

// ============================================================================
// Interaction record
// ============================================================================

/// One logged chat exchange. Created once per processed message; the
/// `feedback` field is set at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub interaction_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    /// Prompt sent to the engine, present only on the generation path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_prompt: Option<String>,
    /// Raw engine output, present only on the generation path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_response: Option<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Value>,
    pub final_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    pub routing: RoutingKind,
}

/// Deterministic fingerprint identifying an interaction.
///
/// First 16 hex characters of a SHA-256 over `session:message:timestamp`.
/// Uniqueness is probabilistic, not guaranteed; the truncated digest is an
/// identifier, not a safe sole primary key at scale.
pub fn interaction_fingerprint(
    session_id: &str,
    message: &str,
    timestamp: &DateTime<Utc>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(b":");
    hasher.update(message.as_bytes());
    hasher.update(b":");
    hasher.update(timestamp.to_rfc3339().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let a = interaction_fingerprint("session-1", "turn on the lights", &ts);
        let b = interaction_fingerprint("session-1", "turn on the lights", &ts);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_fingerprint_varies_by_inputs() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let base = interaction_fingerprint("session-1", "hello", &ts);
        assert_ne!(base, interaction_fingerprint("session-2", "hello", &ts));
        assert_ne!(base, interaction_fingerprint("session-1", "hello!", &ts));

        let later = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 1).unwrap();
        assert_ne!(base, interaction_fingerprint("session-1", "hello", &later));
    }

    #[test]
    fn test_error_envelope_shape() {
        let resp = ToolCallResponse::error("unknown tool: frobnicate");
        assert_eq!(resp.status, ToolStatus::Error);
        assert_eq!(resp.error_message(), Some("unknown tool: frobnicate"));
        assert!(!resp.result_data.is_null());
    }

    #[test]
    fn test_success_envelope_has_no_error_message() {
        let resp = ToolCallResponse::success(json!({ "value": 1 }));
        assert!(resp.is_success());
        assert_eq!(resp.error_message(), None);
    }

    #[test]
    fn test_routing_kind_serialization() {
        let val = serde_json::to_value(RoutingKind::DirectShortcut).unwrap();
        assert_eq!(val, json!("direct_shortcut"));
        assert_eq!(RoutingKind::LlmWithTools.as_str(), "llm_with_tools");
    }

    #[test]
    fn test_feedback_parse_is_strict() {
        assert_eq!(Feedback::parse("thumbs_up"), Some(Feedback::ThumbsUp));
        assert_eq!(Feedback::parse("thumbs_down"), Some(Feedback::ThumbsDown));
        assert_eq!(Feedback::parse("maybe"), None);
        assert_eq!(Feedback::parse("THUMBS_UP"), None);
        assert_eq!(Feedback::parse(""), None);
    }

    #[test]
    fn test_tool_call_request_defaults_session() {
        let req: ToolCallRequest =
            serde_json::from_str(r#"{"tool_name": "get_network_time"}"#).unwrap();
        assert_eq!(req.session_id, DEFAULT_SESSION);
        assert!(req.arguments.is_null());
    }
}
