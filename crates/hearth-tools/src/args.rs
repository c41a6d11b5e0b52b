//! Typed tool arguments.
//!
//! Every tool deserialises its arguments into one struct here before any
//! work happens. Unknown fields, missing required fields and out-of-range
//! values are all rejected at this boundary, so the tool bodies never read
//! ad hoc JSON keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::names;
use crate::error::{Result, ToolError};

/// Arguments for `get_network_time`. Takes nothing; the server and
/// timezone come from configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkTimeArgs {}

/// Arguments for `ping_host`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PingArgs {
    pub hostname: String,
}

/// Arguments for `ha_get_device_state`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceStateArgs {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub name_filter: Option<String>,
}

/// Arguments for `ha_control_light`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlLightArgs {
    pub action: ControlAction,
    #[serde(default)]
    pub name_filter: Option<String>,
    /// Applied only with `turn_on`.
    #[serde(default)]
    pub brightness: Option<u8>,
}

/// Arguments for `ha_control_switch`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlSwitchArgs {
    pub action: ControlAction,
    #[serde(default)]
    pub name_filter: Option<String>,
}

/// Arguments for `get_sun_times`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SunTimesArgs {
    #[serde(default)]
    pub date: Option<String>,
}

/// The three hub service calls the control tools may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    TurnOn,
    TurnOff,
    Toggle,
}

impl ControlAction {
    /// Hub service name for this action.
    pub fn service(&self) -> &'static str {
        match self {
            ControlAction::TurnOn => "turn_on",
            ControlAction::TurnOff => "turn_off",
            ControlAction::Toggle => "toggle",
        }
    }
}

/// Arguments for one tool call, tagged by tool name.
#[derive(Debug)]
pub enum ToolArgs {
    NetworkTime(NetworkTimeArgs),
    Ping(PingArgs),
    DeviceState(DeviceStateArgs),
    ControlLight(ControlLightArgs),
    ControlSwitch(ControlSwitchArgs),
    SunTimes(SunTimesArgs),
}

impl ToolArgs {
    /// Validate raw arguments for the named tool. A `null` payload is
    /// treated as an empty object so calls without arguments still parse.
    pub fn parse(tool_name: &str, arguments: Value) -> Result<Self> {
        let arguments = if arguments.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            arguments
        };

        fn typed<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
            serde_json::from_value(arguments)
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))
        }

        match tool_name {
            names::NETWORK_TIME => Ok(ToolArgs::NetworkTime(typed(arguments)?)),
            names::PING_HOST => Ok(ToolArgs::Ping(typed(arguments)?)),
            names::DEVICE_STATE => Ok(ToolArgs::DeviceState(typed(arguments)?)),
            names::CONTROL_LIGHT => Ok(ToolArgs::ControlLight(typed(arguments)?)),
            names::CONTROL_SWITCH => Ok(ToolArgs::ControlSwitch(typed(arguments)?)),
            names::SUN_TIMES => Ok(ToolArgs::SunTimes(typed(arguments)?)),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_arguments_parse_as_empty() {
        let args = ToolArgs::parse("get_network_time", Value::Null).unwrap();
        assert!(matches!(args, ToolArgs::NetworkTime(_)));
    }

    #[test]
    fn test_unknown_tool_rejected() {
        let err = ToolArgs::parse("get_weather", json!({})).unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_ping_requires_hostname() {
        let err = ToolArgs::parse("ping_host", json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("hostname"));

        let args = ToolArgs::parse("ping_host", json!({"hostname": "google.com"})).unwrap();
        match args {
            ToolArgs::Ping(p) => assert_eq!(p.hostname, "google.com"),
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = ToolArgs::parse(
            "ha_control_light",
            json!({"action": "turn_on", "color": "red"}),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_control_action_values() {
        let args = ToolArgs::parse(
            "ha_control_light",
            json!({"action": "toggle", "name_filter": "kitchen"}),
        )
        .unwrap();
        match args {
            ToolArgs::ControlLight(c) => {
                assert_eq!(c.action, ControlAction::Toggle);
                assert_eq!(c.name_filter.as_deref(), Some("kitchen"));
            }
            other => panic!("unexpected parse: {:?}", other),
        }

        // Invalid action never reaches the hub.
        let err = ToolArgs::parse("ha_control_switch", json!({"action": "explode"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_brightness_range_enforced() {
        let err =
            ToolArgs::parse("ha_control_light", json!({"action": "turn_on", "brightness": 300}))
                .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let args =
            ToolArgs::parse("ha_control_light", json!({"action": "turn_on", "brightness": 128}))
                .unwrap();
        match args {
            ToolArgs::ControlLight(c) => assert_eq!(c.brightness, Some(128)),
            other => panic!("unexpected parse: {:?}", other),
        }
    }
}
