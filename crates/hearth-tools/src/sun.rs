//! Sunrise and sunset lookup via the sunrise-sunset.org API.

use serde_json::{Map, Value, json};

use crate::args::SunTimesArgs;
use crate::context::ToolContext;
use crate::error::{Result, ToolError};

const SUN_API_URL: &str = "https://api.sunrise-sunset.org/json";

/// Fields republished verbatim from the upstream response.
const SUN_FIELDS: [&str; 10] = [
    "sunrise",
    "sunset",
    "solar_noon",
    "day_length",
    "civil_twilight_begin",
    "civil_twilight_end",
    "nautical_twilight_begin",
    "nautical_twilight_end",
    "astronomical_twilight_begin",
    "astronomical_twilight_end",
];

pub async fn sun_times(ctx: &ToolContext, args: SunTimesArgs) -> Result<Value> {
    let (lat, lng) = ctx.sun.coordinates().ok_or_else(|| {
        ToolError::NotConfigured(
            "Latitude and longitude must be set in the configuration \
             (HEARTH_LATITUDE, HEARTH_LONGITUDE)"
                .to_string(),
        )
    })?;
    let date = args.date.unwrap_or_else(|| "today".to_string());

    let body: Value = ctx
        .http
        .get(SUN_API_URL)
        .query(&[
            ("lat", lat.to_string()),
            ("lng", lng.to_string()),
            ("date", date.clone()),
            ("formatted", "0".to_string()),
        ])
        .send()
        .await
        .map_err(|e| ToolError::Execution(format!("Sun times request failed: {}", e)))?
        .json()
        .await
        .map_err(|e| ToolError::Execution(format!("Sun times response unreadable: {}", e)))?;

    republish(&body, lat, lng, &date)
}

/// Check the API's own status field, then lift the result fields into the
/// tool response alongside the queried location and date.
fn republish(body: &Value, lat: f64, lng: f64, date: &str) -> Result<Value> {
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("missing");
    if status != "OK" {
        return Err(ToolError::Execution(format!(
            "Sun times service returned status {}",
            status
        )));
    }

    let results = body.get("results").cloned().unwrap_or(Value::Null);
    let mut out = Map::new();
    for field in SUN_FIELDS {
        if let Some(value) = results.get(field) {
            out.insert(field.to_string(), value.clone());
        }
    }
    out.insert(
        "location".to_string(),
        json!({ "latitude": lat, "longitude": lng }),
    );
    out.insert("date".to_string(), json!(date));
    Ok(Value::Object(out))
}
