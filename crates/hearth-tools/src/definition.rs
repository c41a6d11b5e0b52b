//! The fixed tool catalog.
//!
//! Six tools, built once at startup. The catalog order is stable so the
//! generation-engine prompt and the HTTP catalog endpoint always list
//! tools the same way.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Canonical tool names.
pub mod names {
    pub const NETWORK_TIME: &str = "get_network_time";
    pub const PING_HOST: &str = "ping_host";
    pub const DEVICE_STATE: &str = "ha_get_device_state";
    pub const CONTROL_LIGHT: &str = "ha_control_light";
    pub const CONTROL_SWITCH: &str = "ha_control_switch";
    pub const SUN_TIMES: &str = "get_sun_times";
}

/// Description of one tool, in the shape generation engines expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Build the full catalog in its fixed order.
pub fn catalog() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            names::NETWORK_TIME,
            "Get the current date and time from an NTP server, with UTC and local renderings",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
        ToolDefinition::new(
            names::PING_HOST,
            "Ping a host to check network connectivity and latency",
            json!({
                "type": "object",
                "properties": {
                    "hostname": {
                        "type": "string",
                        "description": "Host name or IP address to probe"
                    }
                },
                "required": ["hostname"]
            }),
        ),
        ToolDefinition::new(
            names::DEVICE_STATE,
            "Look up the current state of smart-home devices, one by id or a filtered list",
            json!({
                "type": "object",
                "properties": {
                    "entity_id": {
                        "type": "string",
                        "description": "Exact entity id, e.g. light.kitchen"
                    },
                    "domain": {
                        "type": "string",
                        "description": "Device domain to list, e.g. light or switch"
                    },
                    "name_filter": {
                        "type": "string",
                        "description": "Free-text name filter applied to the listing"
                    }
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            names::CONTROL_LIGHT,
            "Turn lights on or off, toggle them, or set brightness",
            json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["turn_on", "turn_off", "toggle"],
                        "description": "What to do with the matched lights"
                    },
                    "name_filter": {
                        "type": "string",
                        "description": "Which lights to target; empty targets all lights"
                    },
                    "brightness": {
                        "type": "integer",
                        "minimum": 0,
                        "maximum": 255,
                        "description": "Brightness to apply when turning on"
                    }
                },
                "required": ["action"]
            }),
        ),
        ToolDefinition::new(
            names::CONTROL_SWITCH,
            "Turn switches and smart plugs on or off, or toggle them",
            json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["turn_on", "turn_off", "toggle"],
                        "description": "What to do with the matched switches"
                    },
                    "name_filter": {
                        "type": "string",
                        "description": "Which switches to target; empty targets all switches"
                    }
                },
                "required": ["action"]
            }),
        ),
        ToolDefinition::new(
            names::SUN_TIMES,
            "Get sunrise, sunset and twilight times for the configured location",
            json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "Date to query, e.g. 2025-06-01 or today"
                    }
                },
                "required": []
            }),
        ),
    ]
}
