//! Shared dependencies handed to every tool.

use std::time::Duration;

use hearth_core::{NetConfig, SunConfig};
use hearth_hub::HubService;

use crate::error::{Result, ToolError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a tool may need, built once at startup and passed by
/// reference. Tools that need the hub fail with a configuration error
/// when it was never set up, instead of panicking on a global.
pub struct ToolContext {
    pub(crate) hub: Option<HubService>,
    pub(crate) net: NetConfig,
    pub(crate) sun: SunConfig,
    pub(crate) http: reqwest::Client,
}

impl ToolContext {
    pub fn new(hub: Option<HubService>, net: NetConfig, sun: SunConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ToolError::Execution(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            hub,
            net,
            sun,
            http,
        })
    }

    /// The hub service, when one is configured.
    pub fn hub(&self) -> Option<&HubService> {
        self.hub.as_ref()
    }

    pub fn net(&self) -> &NetConfig {
        &self.net
    }

    pub fn sun(&self) -> &SunConfig {
        &self.sun
    }
}
