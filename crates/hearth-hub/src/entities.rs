//! Entity types exposed by the automation hub.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Connection settings for one hub instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConnectionConfig {
    /// Hub base URL, e.g. `http://localhost:8123`.
    pub url: String,
    /// Long-lived access token.
    pub token: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    10
}

impl HubConnectionConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: default_timeout(),
        }
    }

    /// Build from loaded configuration; `None` when no token is present.
    pub fn from_config(config: &hearth_core::HubConfig) -> Option<Self> {
        config.token.as_ref().map(|token| Self {
            url: config.url.clone(),
            token: token.clone(),
            timeout: default_timeout(),
        })
    }

    /// WebSocket endpoint derived from the base URL.
    pub fn websocket_url(&self) -> String {
        let url = self.url.trim_end_matches('/');
        let url = url
            .replace("http://", "ws://")
            .replace("https://", "wss://");
        format!("{}/api/websocket", url)
    }

    /// REST API base.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.url.trim_end_matches('/'))
    }
}

/// State of one hub entity as reported over REST or the event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity ID, `<domain>.<object_id>`.
    pub entity_id: String,
    /// Current state value, e.g. `on`, `off`, `23.5`.
    pub state: String,
    #[serde(default)]
    pub attributes: EntityAttributes,
    #[serde(default)]
    pub last_changed: String,
    #[serde(default)]
    pub last_updated: String,
}

impl EntityState {
    /// Display name, falling back to the entity id when unset.
    pub fn display_name(&self) -> &str {
        if self.attributes.friendly_name.is_empty() {
            &self.entity_id
        } else {
            &self.attributes.friendly_name
        }
    }

    pub fn domain(&self) -> Domain {
        Domain::from_entity_id(&self.entity_id)
    }
}

/// Attributes attached to an entity state. Only the fields the tools read
/// are typed; everything else stays in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityAttributes {
    #[serde(default)]
    pub friendly_name: String,

    /// Light brightness, 0-255.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Entity domain, taken from the entity id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Light,
    Switch,
    Sensor,
    BinarySensor,
    #[serde(other)]
    Unknown,
}

impl Domain {
    /// Parse the domain from an entity id.
    pub fn from_entity_id(entity_id: &str) -> Self {
        match entity_id.split('.').next() {
            Some("light") => Domain::Light,
            Some("switch") => Domain::Switch,
            Some("sensor") => Domain::Sensor,
            Some("binary_sensor") => Domain::BinarySensor,
            _ => Domain::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Light => "light",
            Domain::Switch => "switch",
            Domain::Sensor => "sensor",
            Domain::BinarySensor => "binary_sensor",
            Domain::Unknown => "unknown",
        }
    }
}

/// One service invocation against the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// Service domain, e.g. `light`.
    pub domain: String,
    /// Service name, e.g. `turn_on`.
    pub service: String,
    /// Payload; always carries `entity_id`.
    pub service_data: serde_json::Value,
}

impl ServiceCall {
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        let mut service_data = serde_json::Map::new();
        service_data.insert(
            "entity_id".to_string(),
            serde_json::Value::String(entity_id.into()),
        );
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data: serde_json::Value::Object(service_data),
        }
    }

    /// Attach an extra service parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if let Some(obj) = self.service_data.as_object_mut() {
            obj.insert(key.into(), value);
        }
        self
    }
}
