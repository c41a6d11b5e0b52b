//! Device state lookup and control through the automation hub.

use hearth_hub::{Domain, EntityState, HubService, ServiceCall};
use serde_json::{Value, json};
use tokio::time::Duration;

use crate::args::{ControlAction, ControlLightArgs, ControlSwitchArgs, DeviceStateArgs};
use crate::context::ToolContext;
use crate::error::{Result, ToolError};
use crate::resolver;

/// Wait after a control call before re-reading, so the hub has applied it.
const SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Most devices shown in one listing.
const LIST_CAP: usize = 20;

fn hub(ctx: &ToolContext) -> Result<&HubService> {
    ctx.hub.as_ref().ok_or_else(|| {
        ToolError::NotConfigured(
            "Automation hub is not configured; set HEARTH_HUB_URL and HEARTH_HUB_TOKEN".to_string(),
        )
    })
}

/// `ha_get_device_state`: one device by exact id (cache-first), or a
/// filtered listing (always live).
pub async fn device_state(ctx: &ToolContext, args: DeviceStateArgs) -> Result<Value> {
    let hub = hub(ctx)?;

    if let Some(entity_id) = args.entity_id.as_deref() {
        let state = hub.state(entity_id).await?;
        return Ok(serde_json::to_value(&state)?);
    }

    let mut candidates = hub.client().get_states().await?;
    if let Some(domain) = args.domain.as_deref() {
        let prefix = format!("{}.", domain);
        candidates.retain(|s| s.entity_id.starts_with(&prefix));
    }

    let matched = resolver::resolve(args.name_filter.as_deref(), &candidates);
    if matched.is_empty() {
        let shown = args
            .name_filter
            .as_deref()
            .or(args.domain.as_deref())
            .unwrap_or("any");
        return Err(ToolError::Execution(format!(
            "No devices found with filter: {}",
            shown
        )));
    }

    let total = matched.len();
    let devices: Vec<Value> = matched
        .iter()
        .take(LIST_CAP)
        .map(|s| {
            json!({
                "entity_id": s.entity_id,
                "name": s.display_name(),
                "state": s.state,
                "last_changed": s.last_changed,
            })
        })
        .collect();

    let mut result = json!({ "count": total, "devices": devices });
    if total > LIST_CAP {
        result["note"] = json!(format!(
            "Showing first {} of {} matching devices",
            LIST_CAP, total
        ));
    }
    Ok(result)
}

/// `ha_control_light`: resolve lights by filter and apply the action to
/// each. When nothing in the light domain matches, the same filter is
/// retried against switches, since many plug-in lamps are wired through
/// smart plugs.
pub async fn control_light(ctx: &ToolContext, args: ControlLightArgs) -> Result<Value> {
    let hub = hub(ctx)?;

    let lights = hub.list_domain(Domain::Light).await?;
    let matched = resolver::resolve(args.name_filter.as_deref(), &lights);
    if !matched.is_empty() {
        return control_entities(hub, Domain::Light, args.action, args.brightness, &matched).await;
    }

    let switches = hub.list_domain(Domain::Switch).await?;
    let fallback = resolver::resolve(args.name_filter.as_deref(), &switches);
    if fallback.is_empty() {
        return Err(no_devices(Domain::Light, args.name_filter.as_deref()));
    }
    tracing::debug!("Light filter matched no lights, controlling switches instead");
    control_entities(hub, Domain::Switch, args.action, None, &fallback).await
}

/// `ha_control_switch`: resolve switches by filter and apply the action.
pub async fn control_switch(ctx: &ToolContext, args: ControlSwitchArgs) -> Result<Value> {
    let hub = hub(ctx)?;

    let switches = hub.list_domain(Domain::Switch).await?;
    let matched = resolver::resolve(args.name_filter.as_deref(), &switches);
    if matched.is_empty() {
        return Err(no_devices(Domain::Switch, args.name_filter.as_deref()));
    }
    control_entities(hub, Domain::Switch, args.action, None, &matched).await
}

fn no_devices(domain: Domain, filter: Option<&str>) -> ToolError {
    let noun = match domain {
        Domain::Light => "lights",
        Domain::Switch => "switches",
        _ => "devices",
    };
    match filter {
        Some(f) if !f.trim().is_empty() => {
            ToolError::Execution(format!("No {} found matching '{}'", noun, f))
        }
        _ => ToolError::Execution(format!("No {} found", noun)),
    }
}

/// Apply one action to every target. A failing entity contributes an
/// error row; the rest of the batch still runs.
async fn control_entities(
    hub: &HubService,
    domain: Domain,
    action: ControlAction,
    brightness: Option<u8>,
    targets: &[&EntityState],
) -> Result<Value> {
    let mut rows = Vec::with_capacity(targets.len());
    for target in targets {
        rows.push(control_one(hub, domain, action, brightness, target).await);
    }

    let key = match domain {
        Domain::Light => "lights",
        Domain::Switch => "switches",
        _ => "entities",
    };
    let mut result = serde_json::Map::new();
    result.insert("action".to_string(), json!(action.service()));
    result.insert("count".to_string(), json!(rows.len()));
    result.insert(key.to_string(), Value::Array(rows));
    Ok(Value::Object(result))
}

async fn control_one(
    hub: &HubService,
    domain: Domain,
    action: ControlAction,
    brightness: Option<u8>,
    target: &EntityState,
) -> Value {
    let mut call = ServiceCall::new(domain.as_str(), action.service(), target.entity_id.as_str());
    if action == ControlAction::TurnOn {
        if let Some(level) = brightness {
            call = call.with_param("brightness", json!(level));
        }
    }

    if let Err(e) = hub.call_service(call).await {
        tracing::warn!("Service call for {} failed: {}", target.entity_id, e);
        return json!({ "entity_id": target.entity_id, "error": e.to_string() });
    }

    // The hub applies service calls asynchronously; give it a beat, then
    // report the state it actually settled on.
    hub.invalidate(&target.entity_id).await;
    tokio::time::sleep(SETTLE_DELAY).await;

    match hub.fresh_state(&target.entity_id).await {
        Ok(state) => {
            let mut row = json!({
                "entity_id": state.entity_id,
                "friendly_name": state.display_name(),
                "new_state": state.state,
            });
            if let Some(level) = state.attributes.brightness {
                row["brightness"] = json!(level);
            }
            row
        }
        Err(e) => {
            tracing::warn!("Post-control read for {} failed: {}", target.entity_id, e);
            json!({ "entity_id": target.entity_id, "error": e.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_devices_message_includes_filter() {
        let err = no_devices(Domain::Light, Some("attic"));
        assert_eq!(err.to_string(), "No lights found matching 'attic'");

        let err = no_devices(Domain::Switch, None);
        assert_eq!(err.to_string(), "No switches found");
    }

    #[tokio::test]
    async fn test_hub_required() {
        let cfg = hearth_core::Config::default();
        let ctx = ToolContext::new(None, cfg.net, cfg.sun).unwrap();

        let err = device_state(&ctx, DeviceStateArgs::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured(_)));
    }
}
