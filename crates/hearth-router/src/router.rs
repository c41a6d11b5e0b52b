//! Message routing: shortcut check, generation path, tool dispatch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hearth_core::{
    ChatResponse, Interaction, RoutingKind, ToolCallRequest, ToolCallResponse,
    interaction_fingerprint,
};
use hearth_llm::{EngineError, TextEngine};
use hearth_storage::InteractionLifecycle;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::directive;
use crate::invoker::ToolInvoker;
use crate::prompts;
use crate::shortcuts::{self, ShortcutPlan};
use crate::synthesis;

/// Fixed answer when a generation call times out.
pub const TIMEOUT_RESPONSE: &str = "Request timed out. Please try again.";

/// Decides how each message is answered and records every exchange.
///
/// Three outcomes, tried in order: a keyword shortcut calls a tool and
/// renders the answer locally; otherwise the engine is asked once and any
/// emitted directive triggers a tool call plus a synthesis pass; otherwise
/// the engine's text is the answer. Failures degrade to text, never to an
/// error at this boundary.
pub struct RequestRouter {
    engine: Arc<dyn TextEngine>,
    invoker: Arc<dyn ToolInvoker>,
    lifecycle: InteractionLifecycle,
    default_ping_host: String,
}

impl RequestRouter {
    pub fn new(
        engine: Arc<dyn TextEngine>,
        invoker: Arc<dyn ToolInvoker>,
        lifecycle: InteractionLifecycle,
        default_ping_host: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            invoker,
            lifecycle,
            default_ping_host: default_ping_host.into(),
        }
    }

    pub fn lifecycle(&self) -> &InteractionLifecycle {
        &self.lifecycle
    }

    pub async fn route(&self, message: &str, session_id: &str) -> ChatResponse {
        let timestamp = Utc::now();
        let interaction_id = interaction_fingerprint(session_id, message, &timestamp);

        let mut shortcut_failure = None;
        if let Some(plan) = shortcuts::plan(message, &self.default_ping_host) {
            debug!(
                "Shortcut {} matched for session {}",
                plan.pattern, session_id
            );
            let request =
                ToolCallRequest::new(plan.tool_name, plan.arguments.clone()).with_session(session_id);
            let envelope = self.invoker.invoke(&request).await;

            if envelope.is_success() {
                return self
                    .finish_shortcut(message, session_id, interaction_id, timestamp, plan, envelope)
                    .await;
            }

            warn!(
                "Shortcut tool {} failed, deferring to the engine: {}",
                plan.tool_name,
                envelope.error_message().unwrap_or("unknown error")
            );
            shortcut_failure = Some(json!({
                "pattern_matched": plan.pattern,
                "tool_name": plan.tool_name,
                "arguments": plan.arguments,
                "error": envelope.result_data,
            }));
        }

        self.generation_path(message, session_id, interaction_id, timestamp, shortcut_failure)
            .await
    }

    async fn finish_shortcut(
        &self,
        message: &str,
        session_id: &str,
        interaction_id: String,
        timestamp: DateTime<Utc>,
        plan: ShortcutPlan,
        envelope: ToolCallResponse,
    ) -> ChatResponse {
        let final_response = synthesis::render_shortcut(plan.tool_name, &envelope.result_data);
        let tool_results = envelope_results(plan.tool_name, &envelope);

        let debug = json!({
            "routing": RoutingKind::DirectShortcut.as_str(),
            "explanation": "Keyword routing bypassed the engine entirely",
            "user_message": message,
            "pattern_matched": plan.pattern,
            "keywords_detected": plan.keywords,
            "extracted_params": plan.params,
            "tool_call": { "tool_name": plan.tool_name, "arguments": plan.arguments },
            "tool_results": tool_results.clone(),
        });

        let interaction = Interaction {
            interaction_id,
            session_id: session_id.to_string(),
            timestamp,
            user_message: message.to_string(),
            llm_prompt: None,
            llm_response: None,
            tools_used: vec![plan.tool_name.to_string()],
            tool_results: Some(tool_results),
            final_response,
            feedback: None,
            routing: RoutingKind::DirectShortcut,
        };
        self.record_and_respond(interaction, debug).await
    }

    async fn generation_path(
        &self,
        message: &str,
        session_id: &str,
        interaction_id: String,
        timestamp: DateTime<Utc>,
        shortcut_failure: Option<Value>,
    ) -> ChatResponse {
        let prompt = prompts::tool_selection_prompt(message);

        let started = std::time::Instant::now();
        let outcome = self.engine.generate(&prompt).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let generated = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!("Generation failed: {}", e);
                let mut debug = json!({
                    "routing": RoutingKind::LlmOnly.as_str(),
                    "user_message": message,
                    "model": self.engine.model_name(),
                    "prompt": prompt.clone(),
                    "latency_ms": latency_ms,
                    "error": e.to_string(),
                });
                attach_shortcut_failure(&mut debug, shortcut_failure);

                let interaction = Interaction {
                    interaction_id,
                    session_id: session_id.to_string(),
                    timestamp,
                    user_message: message.to_string(),
                    llm_prompt: Some(prompt),
                    llm_response: None,
                    tools_used: Vec::new(),
                    tool_results: None,
                    final_response: degraded_response(&e),
                    feedback: None,
                    routing: RoutingKind::LlmOnly,
                };
                return self.record_and_respond(interaction, debug).await;
            }
        };

        let directive = match directive::parse_directive(&generated) {
            Some(directive) => directive,
            None => {
                // Plain conversational answer.
                let mut debug = json!({
                    "routing": RoutingKind::LlmOnly.as_str(),
                    "user_message": message,
                    "model": self.engine.model_name(),
                    "prompt": prompt.clone(),
                    "latency_ms": latency_ms,
                    "response": generated.clone(),
                });
                attach_shortcut_failure(&mut debug, shortcut_failure);

                let interaction = Interaction {
                    interaction_id,
                    session_id: session_id.to_string(),
                    timestamp,
                    user_message: message.to_string(),
                    llm_prompt: Some(prompt),
                    llm_response: Some(generated.clone()),
                    tools_used: Vec::new(),
                    tool_results: None,
                    final_response: generated,
                    feedback: None,
                    routing: RoutingKind::LlmOnly,
                };
                return self.record_and_respond(interaction, debug).await;
            }
        };

        info!(
            "Engine selected tool {} for session {}",
            directive.tool_name, session_id
        );
        let request = ToolCallRequest::new(directive.tool_name.clone(), directive.arguments.clone())
            .with_session(session_id);
        let envelope = self.invoker.invoke(&request).await;
        let tool_results = envelope_results(&directive.tool_name, &envelope);

        let final_prompt = prompts::synthesis_prompt(message, &tool_results);
        let started = std::time::Instant::now();
        let (final_response, synthesis_error) = match self.engine.generate(&final_prompt).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("Synthesis generation failed: {}", e);
                (degraded_response(&e), Some(e.to_string()))
            }
        };
        let final_latency_ms = started.elapsed().as_millis() as u64;

        let mut debug = json!({
            "routing": RoutingKind::LlmWithTools.as_str(),
            "user_message": message,
            "model": self.engine.model_name(),
            "initial_prompt": prompt.clone(),
            "initial_response": generated.clone(),
            "initial_latency_ms": latency_ms,
            "tool_call": {
                "tool_name": directive.tool_name.clone(),
                "arguments": directive.arguments.clone(),
            },
            "tool_results": tool_results.clone(),
            "final_prompt": final_prompt,
            "final_response": final_response.clone(),
            "final_latency_ms": final_latency_ms,
        });
        if let Some(error) = synthesis_error {
            debug["synthesis_error"] = json!(error);
        }
        attach_shortcut_failure(&mut debug, shortcut_failure);

        let interaction = Interaction {
            interaction_id,
            session_id: session_id.to_string(),
            timestamp,
            user_message: message.to_string(),
            llm_prompt: Some(prompt),
            llm_response: Some(format!("Initial: {}\nFinal: {}", generated, final_response)),
            tools_used: vec![directive.tool_name],
            tool_results: Some(tool_results),
            final_response,
            feedback: None,
            routing: RoutingKind::LlmWithTools,
        };
        self.record_and_respond(interaction, debug).await
    }

    async fn record_and_respond(&self, interaction: Interaction, debug: Value) -> ChatResponse {
        let response = ChatResponse {
            response: interaction.final_response.clone(),
            tools_used: interaction.tools_used.clone(),
            session_id: interaction.session_id.clone(),
            timestamp: interaction.timestamp,
            interaction_id: interaction.interaction_id.clone(),
            routing: interaction.routing,
            debug: Some(debug),
        };
        self.lifecycle.record(interaction).await;
        response
    }
}

fn degraded_response(error: &EngineError) -> String {
    match error {
        EngineError::Timeout => TIMEOUT_RESPONSE.to_string(),
        other => format!("Error generating response: {}", other),
    }
}

fn envelope_results(tool_name: &str, envelope: &ToolCallResponse) -> Value {
    let mut map = serde_json::Map::new();
    map.insert(
        tool_name.to_string(),
        serde_json::to_value(envelope).unwrap_or_else(|_| json!({})),
    );
    Value::Object(map)
}

fn attach_shortcut_failure(debug: &mut Value, failure: Option<Value>) {
    if let Some(failure) = failure {
        debug["shortcut_attempt"] = failure;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearth_llm::EngineResult;
    use hearth_storage::{DurableStore, EphemeralStore};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedEngine {
        responses: Mutex<VecDeque<EngineResult<String>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedEngine {
        fn new(responses: Vec<EngineResult<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl TextEngine for ScriptedEngine {
        async fn generate(&self, _prompt: &str) -> EngineResult<String> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(hearth_llm::EngineError::Generation("script exhausted".to_string())))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    struct RecordingInvoker {
        requests: Mutex<Vec<ToolCallRequest>>,
        responses: Mutex<VecDeque<ToolCallResponse>>,
    }

    impl RecordingInvoker {
        fn new(responses: Vec<ToolCallResponse>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            }
        }

        fn requests(&self) -> Vec<ToolCallRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolInvoker for RecordingInvoker {
        async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResponse {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ToolCallResponse::error("no scripted envelope"))
        }
    }

    fn fixture(
        engine_responses: Vec<EngineResult<String>>,
        invoker_responses: Vec<ToolCallResponse>,
    ) -> (RequestRouter, Arc<ScriptedEngine>, Arc<RecordingInvoker>) {
        let engine = Arc::new(ScriptedEngine::new(engine_responses));
        let invoker = Arc::new(RecordingInvoker::new(invoker_responses));
        let lifecycle = InteractionLifecycle::new(
            EphemeralStore::new(),
            Arc::new(DurableStore::memory().unwrap()),
        );
        let router = RequestRouter::new(engine.clone(), invoker.clone(), lifecycle, "google.com");
        (router, engine, invoker)
    }

    #[tokio::test]
    async fn test_time_query_never_touches_the_engine() {
        let envelope = ToolCallResponse::success(json!({
            "source": "NTP Server: pool.ntp.org",
            "readable_local": "2025-06-01 05:00:00 AM PDT",
        }));
        let (router, engine, invoker) = fixture(vec![], vec![envelope]);

        let response = router.route("What time is it?", "default").await;

        assert_eq!(response.routing, RoutingKind::DirectShortcut);
        assert_eq!(response.tools_used, vec!["get_network_time".to_string()]);
        assert!(response.response.contains("2025-06-01 05:00:00 AM PDT"));
        assert_eq!(engine.calls(), 0);

        let requests = invoker.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "get_network_time");
        assert_eq!(requests[0].session_id, "default");

        let logged = router
            .lifecycle()
            .get("default", &response.interaction_id)
            .await
            .unwrap();
        assert_eq!(logged.routing, RoutingKind::DirectShortcut);
        assert!(logged.llm_prompt.is_none());
    }

    #[tokio::test]
    async fn test_directive_path_runs_two_generations() {
        let (router, engine, invoker) = fixture(
            vec![
                Ok("USE_TOOL:ping_host:{\"hostname\": \"example.com\"}".to_string()),
                Ok("example.com answered in about 15 ms.".to_string()),
            ],
            vec![ToolCallResponse::success(json!({
                "hostname": "example.com",
                "packet_loss_percent": 0,
                "avg_latency_ms": 15.2,
                "is_success": true,
                "status": "Host Reachable",
            }))],
        );

        let response = router.route("is example.com up right now?", "default").await;

        assert_eq!(response.routing, RoutingKind::LlmWithTools);
        assert_eq!(response.tools_used, vec!["ping_host".to_string()]);
        assert_eq!(response.response, "example.com answered in about 15 ms.");
        assert_eq!(engine.calls(), 2);

        let requests = invoker.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].arguments, json!({ "hostname": "example.com" }));

        let logged = router
            .lifecycle()
            .get("default", &response.interaction_id)
            .await
            .unwrap();
        assert!(logged.tool_results.unwrap().get("ping_host").is_some());
        assert!(logged.llm_response.unwrap().starts_with("Initial:"));
    }

    #[tokio::test]
    async fn test_conversational_answer_uses_no_tools() {
        let (router, engine, invoker) = fixture(
            vec![Ok("Paris is the capital of France.".to_string())],
            vec![],
        );

        let response = router
            .route("what is the capital of France?", "default")
            .await;

        assert_eq!(response.routing, RoutingKind::LlmOnly);
        assert!(response.tools_used.is_empty());
        assert_eq!(response.response, "Paris is the capital of France.");
        assert_eq!(engine.calls(), 1);
        assert!(invoker.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generation_timeout_degrades_to_apology() {
        let (router, _, _) = fixture(vec![Err(EngineError::Timeout)], vec![]);

        let response = router.route("write me a poem", "default").await;

        assert_eq!(response.response, TIMEOUT_RESPONSE);
        assert_eq!(response.routing, RoutingKind::LlmOnly);

        let logged = router
            .lifecycle()
            .get("default", &response.interaction_id)
            .await
            .unwrap();
        assert_eq!(logged.final_response, TIMEOUT_RESPONSE);
    }

    #[tokio::test]
    async fn test_synthesis_timeout_degrades_to_apology() {
        let (router, engine, _) = fixture(
            vec![
                Ok("USE_TOOL:get_sun_times:{}".to_string()),
                Err(EngineError::Timeout),
            ],
            vec![ToolCallResponse::success(json!({ "sunrise": "05:42" }))],
        );

        let response = router.route("when does the sun rise tomorrow?", "default").await;

        assert_eq!(response.response, TIMEOUT_RESPONSE);
        assert_eq!(response.routing, RoutingKind::LlmWithTools);
        assert_eq!(response.tools_used, vec!["get_sun_times".to_string()]);
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_shortcut_defers_to_engine() {
        let (router, engine, invoker) = fixture(
            vec![Ok("I could not find any lights called attic.".to_string())],
            vec![ToolCallResponse::error("No lights found matching 'attic'")],
        );

        let response = router.route("turn on the attic lights", "default").await;

        assert_eq!(response.routing, RoutingKind::LlmOnly);
        assert_eq!(engine.calls(), 1);
        assert_eq!(invoker.requests().len(), 1);

        let debug = response.debug.unwrap();
        assert_eq!(debug["shortcut_attempt"]["tool_name"], "ha_control_light");
        assert_eq!(debug["shortcut_attempt"]["pattern_matched"], "light_control");
    }
}
