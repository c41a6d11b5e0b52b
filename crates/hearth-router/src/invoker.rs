//! Tool invocation seam between the router and the registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hearth_core::{ToolCallRequest, ToolCallResponse};
use hearth_tools::ToolRegistry;
use tracing::warn;

const INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Where tool calls go.
///
/// The chat side either hosts the registry in process or forwards to a
/// remote tools service; the router cannot tell the difference. Failures
/// surface as error envelopes, never as transport errors.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResponse;
}

/// Registry hosted in the same process.
pub struct InProcessInvoker {
    registry: Arc<ToolRegistry>,
}

impl InProcessInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ToolInvoker for InProcessInvoker {
    async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResponse {
        self.registry.execute(request).await
    }
}

/// Remote tools service reached over HTTP.
pub struct HttpInvoker {
    base_url: String,
    client: reqwest::Client,
}

impl HttpInvoker {
    pub fn new(base_url: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(INVOKE_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl ToolInvoker for HttpInvoker {
    async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResponse {
        let url = format!("{}/api/tools/execute", self.base_url);

        let response = match self.client.post(&url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Tools service unreachable: {}", e);
                return ToolCallResponse::error(format!("Tools service unreachable: {}", e));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!("Tools service returned HTTP {}", status);
            return ToolCallResponse::error(format!("Tools service returned HTTP {}", status));
        }

        match response.json::<ToolCallResponse>().await {
            Ok(envelope) => envelope,
            Err(e) => ToolCallResponse::error(format!("Invalid tools service response: {}", e)),
        }
    }
}
