//! Prompt templates for the generation path.

use serde_json::Value;

/// First-pass prompt: list the tools, teach the directive grammar, and
/// leave the conversational escape hatch open.
pub fn tool_selection_prompt(user_message: &str) -> String {
    format!(
        r#"You are an assistant with access to network and smart home tools. Analyze the user's request and respond appropriately.

User request: "{user_message}"

Available Tools:
1. get_network_time - Get the current accurate time from an NTP server
2. ping_host - Test network connectivity to a hostname
3. ha_get_device_state - Get the state of smart home devices and sensors
4. ha_control_light - Control lights (turn on/off, toggle, brightness)
5. ha_control_switch - Control switches (turn on/off, toggle)
6. get_sun_times - Get sunrise and sunset times for the configured location

Instructions:
- For time/date queries: USE_TOOL:get_network_time:{{}}
- For ping/connectivity: USE_TOOL:ping_host:{{"hostname": "HOSTNAME"}}
- For device/sensor queries: USE_TOOL:ha_get_device_state:{{"domain": "sensor", "name_filter": "LOCATION"}}
- For light control: USE_TOOL:ha_control_light:{{"action": "turn_on|turn_off|toggle", "name_filter": "ROOM"}}
- For switch control: USE_TOOL:ha_control_switch:{{"action": "turn_on|turn_off|toggle", "name_filter": "DEVICE"}}
- For sunrise/sunset queries: USE_TOOL:get_sun_times:{{"date": "YYYY-MM-DD"}}
- Otherwise, provide a helpful conversational response

Your response:"#
    )
}

/// Second-pass prompt: hand the serialized tool output back and ask for a
/// user-facing answer.
pub fn synthesis_prompt(user_message: &str, tool_results: &Value) -> String {
    let serialized = serde_json::to_string_pretty(tool_results)
        .unwrap_or_else(|_| tool_results.to_string());
    format!(
        r#"Based on the tool results below, provide a helpful answer to the user's question.

Tool Results:
{serialized}

User Question: {user_message}

Provide a clear, helpful response using the information from the tools."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selection_prompt_lists_every_tool() {
        let prompt = tool_selection_prompt("what's the weather like?");
        for name in [
            "get_network_time",
            "ping_host",
            "ha_get_device_state",
            "ha_control_light",
            "ha_control_switch",
            "get_sun_times",
        ] {
            assert!(prompt.contains(name), "missing {}", name);
        }
        assert!(prompt.contains("USE_TOOL:get_network_time:{}"));
        assert!(prompt.contains("provide a helpful conversational response"));
        assert!(prompt.contains("what's the weather like?"));
    }

    #[test]
    fn test_synthesis_prompt_embeds_results() {
        let results = json!({ "ping_host": { "status": "success" } });
        let prompt = synthesis_prompt("is my server up?", &results);
        assert!(prompt.contains("Tool Results:"));
        assert!(prompt.contains("\"ping_host\""));
        assert!(prompt.contains("User Question: is my server up?"));
    }
}
