//! Local rendering of tool results on the shortcut path.
//!
//! Shortcut routing never goes back to the engine for wording; these
//! renderers turn the tool payload into the final answer directly.

use hearth_tools::names;
use serde_json::Value;

/// Render `data` (a successful tool payload) for the given tool.
pub fn render_shortcut(tool_name: &str, data: &Value) -> String {
    match tool_name {
        names::NETWORK_TIME => render_time(data),
        names::PING_HOST => render_ping(data),
        names::CONTROL_LIGHT => render_control(data, "light"),
        names::CONTROL_SWITCH => render_control(data, "switch"),
        _ => data.to_string(),
    }
}

fn render_time(data: &Value) -> String {
    let source = data
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or("unknown source");
    let readable = data
        .get("readable_local")
        .or_else(|| data.get("readable_utc"))
        .and_then(Value::as_str)
        .unwrap_or("unknown time");
    format!("The current time according to {} is: {}", source, readable)
}

fn render_ping(data: &Value) -> String {
    let hostname = data
        .get("hostname")
        .and_then(Value::as_str)
        .unwrap_or("the host");
    let status = data
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown status");
    let loss = data.get("packet_loss_percent").and_then(Value::as_u64);

    let mut text = format!("Ping test to {}: {}. ", hostname, status);
    match loss {
        Some(0) => {
            let latency = data
                .get("avg_latency_ms")
                .and_then(Value::as_f64)
                .map(|ms| format!("{:.1}", ms))
                .unwrap_or_else(|| "unknown".to_string());
            text.push_str(&format!(
                "Connection successful with {} ms average latency.",
                latency
            ));
        }
        Some(pct) => text.push_str(&format!("{}% packet loss detected.", pct)),
        None => text.push_str("Packet loss unknown."),
    }
    text
}

fn render_control(data: &Value, noun: &str) -> String {
    let key = if noun == "switch" { "switches" } else { "lights" };
    let rows = match data.get(key).and_then(Value::as_array) {
        Some(rows) => rows,
        None => return data.to_string(),
    };
    let count = data
        .get("count")
        .and_then(Value::as_u64)
        .unwrap_or(rows.len() as u64);

    if count == 1 {
        if let Some(row) = rows.first() {
            return format!("✓ {} is now {}", row_name(row, noun), row_state(row));
        }
    }

    let label = if noun == "switch" {
        "switch(es)"
    } else {
        "light(s)"
    };
    let mut parts = vec![format!("✓ Controlled {} {}:", count, label)];
    for row in rows {
        parts.push(format!("  • {}: {}", row_name(row, noun), row_state(row)));
    }
    parts.join("\n")
}

fn row_name<'a>(row: &'a Value, fallback: &'a str) -> &'a str {
    row.get("friendly_name")
        .or_else(|| row.get("entity_id"))
        .and_then(Value::as_str)
        .unwrap_or(fallback)
}

fn row_state(row: &Value) -> &str {
    row.get("new_state")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}
