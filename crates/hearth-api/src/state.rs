//! Handler state, assembled once at startup and injected through axum.

use std::sync::Arc;

use hearth_llm::TextEngine;
use hearth_router::RequestRouter;
use hearth_tools::ToolRegistry;

/// Everything the tools service handlers need.
#[derive(Clone)]
pub struct ToolsState {
    pub registry: Arc<ToolRegistry>,
}

impl ToolsState {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

/// Everything the chat service handlers need. The lifecycle is reached
/// through the router, which owns it.
#[derive(Clone)]
pub struct ChatState {
    pub router: Arc<RequestRouter>,
    pub engine: Arc<dyn TextEngine>,
}

impl ChatState {
    pub fn new(router: Arc<RequestRouter>, engine: Arc<dyn TextEngine>) -> Self {
        Self { router, engine }
    }
}
