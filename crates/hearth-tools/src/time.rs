//! Network time lookup over SNTP.
//!
//! A minimal client-mode query: one 48-byte packet out, one back, and the
//! transmit timestamp (bytes 40..48) is the answer. Tries the configured
//! primary server, then the fallback; when both fail the system clock is
//! reported with the source marked degraded.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{Value, json};
use tokio::net::UdpSocket;
use tokio::time::{Duration, timeout};

use crate::context::ToolContext;
use crate::error::{Result, ToolError};

const NTP_PACKET_SIZE: usize = 48;
/// LI=0, version 3, mode 3 (client).
const NTP_CLIENT_MODE: u8 = 0x1B;
const NTP_PORT: u16 = 123;
/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
const NTP_UNIX_EPOCH_DELTA: u64 = 2_208_988_800;
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn network_time(ctx: &ToolContext) -> Result<Value> {
    let tz: Tz = ctx
        .net
        .timezone
        .parse()
        .map_err(|_| ToolError::Execution(format!("Unknown timezone: {}", ctx.net.timezone)))?;

    for server in [&ctx.net.ntp_server, &ctx.net.ntp_fallback] {
        match query_server(server).await {
            Ok((server_time, offset_ms)) => {
                return Ok(render(
                    server_time,
                    offset_ms,
                    tz,
                    format!("NTP Server: {}", server),
                ));
            }
            Err(e) => tracing::warn!("NTP query to {} failed: {}", server, e),
        }
    }

    tracing::warn!("All NTP servers unreachable, reporting system clock");
    Ok(render(
        Utc::now(),
        0.0,
        tz,
        "System clock (NTP unavailable)".to_string(),
    ))
}

/// One SNTP round trip. Returns the server's clock and its offset from
/// the local clock in milliseconds.
async fn query_server(host: &str) -> Result<(DateTime<Utc>, f64)> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| ToolError::Execution(format!("NTP socket error: {}", e)))?;
    socket
        .connect((host, NTP_PORT))
        .await
        .map_err(|e| ToolError::Execution(format!("NTP connect to {} failed: {}", host, e)))?;

    let mut request = [0u8; NTP_PACKET_SIZE];
    request[0] = NTP_CLIENT_MODE;
    socket
        .send(&request)
        .await
        .map_err(|e| ToolError::Execution(format!("NTP send failed: {}", e)))?;

    let mut response = [0u8; NTP_PACKET_SIZE];
    let received = timeout(QUERY_TIMEOUT, socket.recv(&mut response))
        .await
        .map_err(|_| ToolError::Timeout)?
        .map_err(|e| ToolError::Execution(format!("NTP receive failed: {}", e)))?;
    if received < NTP_PACKET_SIZE {
        return Err(ToolError::Execution(format!(
            "Short NTP response: {} bytes",
            received
        )));
    }

    let server_time = transmit_timestamp(&response)?;
    let offset = server_time.signed_duration_since(Utc::now());
    let offset_ms = offset.num_microseconds().unwrap_or(0) as f64 / 1000.0;
    Ok((server_time, offset_ms))
}

/// Decode the transmit timestamp field into a UTC instant.
fn transmit_timestamp(packet: &[u8; NTP_PACKET_SIZE]) -> Result<DateTime<Utc>> {
    let secs = u32::from_be_bytes([packet[40], packet[41], packet[42], packet[43]]);
    let frac = u32::from_be_bytes([packet[44], packet[45], packet[46], packet[47]]);

    let unix_secs = (secs as i64) - (NTP_UNIX_EPOCH_DELTA as i64);
    if unix_secs < 0 {
        return Err(ToolError::Execution(
            "NTP timestamp predates the Unix epoch".to_string(),
        ));
    }
    let nanos = ((frac as u64) * 1_000_000_000 >> 32) as u32;

    DateTime::from_timestamp(unix_secs, nanos)
        .ok_or_else(|| ToolError::Execution("NTP timestamp out of range".to_string()))
}

fn render(utc: DateTime<Utc>, offset_ms: f64, tz: Tz, source: String) -> Value {
    let local = utc.with_timezone(&tz);
    json!({
        "timestamp_utc": utc.to_rfc3339(),
        "timestamp_local": local.to_rfc3339(),
        "timezone": tz.name(),
        "readable_utc": utc.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        "readable_local": local.format("%Y-%m-%d %I:%M:%S %p %Z").to_string(),
        "offset_ms": round2(offset_ms),
        "source": source,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_mode_byte() {
        // Version 3 in bits 3-5, mode 3 (client) in bits 0-2.
        assert_eq!((NTP_CLIENT_MODE >> 3) & 0x07, 3);
        assert_eq!(NTP_CLIENT_MODE & 0x07, 3);
    }

    #[test]
    fn test_transmit_timestamp_decoding() {
        let mut packet = [0u8; NTP_PACKET_SIZE];
        // 2025-01-01T00:00:00Z plus half a second.
        let ntp_secs: u32 = (1_735_689_600u64 + NTP_UNIX_EPOCH_DELTA) as u32;
        packet[40..44].copy_from_slice(&ntp_secs.to_be_bytes());
        packet[44..48].copy_from_slice(&0x8000_0000u32.to_be_bytes());

        let decoded = transmit_timestamp(&packet).unwrap();
        assert_eq!(decoded.timestamp(), 1_735_689_600);
        assert_eq!(decoded.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_pre_epoch_timestamp_rejected() {
        let packet = [0u8; NTP_PACKET_SIZE];
        assert!(transmit_timestamp(&packet).is_err());
    }

    #[test]
    fn test_render_fields() {
        let utc = DateTime::from_timestamp(1_748_779_200, 0).unwrap(); // 2025-06-01T12:00:00Z
        let result = render(
            utc,
            3.14159,
            chrono_tz::America::Los_Angeles,
            "NTP Server: pool.ntp.org".to_string(),
        );

        assert_eq!(result["timezone"], "America/Los_Angeles");
        assert_eq!(result["readable_utc"], "2025-06-01 12:00:00 UTC");
        assert_eq!(result["readable_local"], "2025-06-01 05:00:00 AM PDT");
        assert_eq!(result["offset_ms"], 3.14);
        assert_eq!(result["source"], "NTP Server: pool.ntp.org");
    }
}
