//! Tool registry: the fixed catalog plus the dispatch path.

use hearth_core::{ToolCallRequest, ToolCallResponse};
use serde_json::Value;

use crate::args::ToolArgs;
use crate::context::ToolContext;
use crate::definition::{ToolDefinition, catalog};
use crate::error::Result;
use crate::{device, ping, sun, time};

/// Owns the tool catalog and the shared context.
///
/// `execute` is total: any failure, including an unknown tool name or bad
/// arguments, comes back as an error envelope rather than an `Err`, so
/// callers always have a response to forward.
pub struct ToolRegistry {
    context: ToolContext,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(context: ToolContext) -> Self {
        Self {
            context,
            definitions: catalog(),
        }
    }

    /// All tool definitions, in catalog order.
    pub fn catalog(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn has(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Run one tool call to completion.
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolCallResponse {
        let started = std::time::Instant::now();
        match self
            .dispatch(&request.tool_name, request.arguments.clone())
            .await
        {
            Ok(data) => {
                tracing::debug!(
                    "Tool {} finished in {}ms",
                    request.tool_name,
                    started.elapsed().as_millis()
                );
                ToolCallResponse::success(data)
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", request.tool_name, e);
                ToolCallResponse::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value> {
        match ToolArgs::parse(name, arguments)? {
            ToolArgs::NetworkTime(_) => time::network_time(&self.context).await,
            ToolArgs::Ping(args) => ping::ping_host(args).await,
            ToolArgs::DeviceState(args) => device::device_state(&self.context, args).await,
            ToolArgs::ControlLight(args) => device::control_light(&self.context, args).await,
            ToolArgs::ControlSwitch(args) => device::control_switch(&self.context, args).await,
            ToolArgs::SunTimes(args) => sun::sun_times(&self.context, args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let cfg = hearth_core::Config::default();
        ToolRegistry::new(ToolContext::new(None, cfg.net, cfg.sun).unwrap())
    }

    #[test]
    fn test_catalog_exposed() {
        let registry = registry();
        assert_eq!(registry.len(), 6);
        assert!(registry.has("get_network_time"));
        assert!(registry.has("ha_control_light"));
        assert!(!registry.has("get_weather"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_envelope() {
        let registry = registry();
        let response = registry
            .execute(&ToolCallRequest::new("get_weather", json!({})))
            .await;

        assert!(!response.is_success());
        let message = response.error_message().unwrap_or_default();
        assert!(message.contains("get_weather"));
    }

    #[tokio::test]
    async fn test_missing_hostname_rejected_before_probe() {
        let registry = registry();
        let response = registry
            .execute(&ToolCallRequest::new("ping_host", json!({})))
            .await;

        assert!(!response.is_success());
        let message = response.error_message().unwrap_or_default();
        assert!(message.contains("hostname"));
    }

    #[tokio::test]
    async fn test_hub_tools_report_missing_configuration() {
        let registry = registry();
        let response = registry
            .execute(&ToolCallRequest::new(
                "ha_control_switch",
                json!({"action": "turn_on"}),
            ))
            .await;

        assert!(!response.is_success());
        let message = response.error_message().unwrap_or_default();
        assert!(message.contains("not configured"));
    }
}
