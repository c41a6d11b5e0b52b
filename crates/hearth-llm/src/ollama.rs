//! Ollama generation backend.
//!
//! Talks to Ollama's native API: one non-streaming `/api/chat` call per
//! generation, `/api/tags` as the availability probe.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::engine::TextEngine;
use crate::error::{EngineError, EngineResult};

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama endpoint (default: http://localhost:11434)
    pub endpoint: String,

    /// Model name, e.g. "llama3.2"
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl OllamaConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: model.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set a custom endpoint. Ollama's native API lives at the bare host
    /// root, so an OpenAI-style `/v1` suffix is stripped.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let mut endpoint: String = endpoint.into();
        endpoint = endpoint.trim_end_matches('/').to_string();
        if let Some(stripped) = endpoint.strip_suffix("/v1") {
            endpoint = stripped.to_string();
        }
        self.endpoint = endpoint;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Build from loaded configuration.
    pub fn from_config(config: &hearth_core::EngineConfig) -> Self {
        Self::new(config.model.clone())
            .with_endpoint(config.endpoint.clone())
            .with_timeout_secs(config.timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new("llama3.2")
    }
}

/// Ollama-backed engine.
pub struct OllamaEngine {
    config: OllamaConfig,
    client: Client,
}

impl OllamaEngine {
    pub fn new(config: OllamaConfig) -> EngineResult<Self> {
        tracing::debug!("Creating Ollama engine for endpoint {}", config.endpoint);
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| EngineError::Network(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl TextEngine for OllamaEngine {
    async fn generate(&self, prompt: &str) -> EngineResult<String> {
        let url = format!("{}/api/chat", self.config.endpoint);
        let request = ChatRequestBody {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest)?;
        if !status.is_success() {
            return Err(EngineError::Generation(format!(
                "Ollama API error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: ChatResponseBody = serde_json::from_str(&body)?;
        if !parsed.done {
            return Err(EngineError::Generation(
                "response ended before completion".to_string(),
            ));
        }

        tracing::debug!(
            "Ollama answered in {}ms ({} chars)",
            started.elapsed().as_millis(),
            parsed.message.content.len()
        );
        Ok(parsed.message.content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.config.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

fn map_reqwest(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Timeout
    } else {
        EngineError::Network(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    message: ResponseMessage,
    done: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalization() {
        let config = OllamaConfig::new("llama3.2").with_endpoint("http://box:11434/v1/");
        assert_eq!(config.endpoint, "http://box:11434");

        let config = OllamaConfig::new("llama3.2").with_endpoint("http://box:11434");
        assert_eq!(config.endpoint, "http://box:11434");
    }

    #[test]
    fn test_from_loaded_config() {
        let engine_config = hearth_core::Config::default().engine;
        let config = OllamaConfig::from_config(&engine_config);
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.endpoint, "http://localhost:11434");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "model": "llama3.2",
            "created_at": "2025-06-01T12:00:00Z",
            "message": { "role": "assistant", "content": "Hello there" },
            "done": true
        }"#;
        let parsed: ChatResponseBody = serde_json::from_str(body).unwrap();
        assert!(parsed.done);
        assert_eq!(parsed.message.content, "Hello there");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequestBody {
            model: "llama3.2",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades() {
        // Port 9 (discard) refuses the connection outright.
        let engine =
            OllamaEngine::new(OllamaConfig::new("llama3.2").with_endpoint("http://127.0.0.1:9"))
                .unwrap();

        assert!(!engine.is_available().await);

        let err = engine.generate("hello").await.unwrap_err();
        assert!(matches!(err, EngineError::Network(_) | EngineError::Timeout));
    }
}
