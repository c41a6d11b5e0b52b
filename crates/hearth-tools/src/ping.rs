//! Host reachability probe built on the platform ping command.

use serde_json::{Value, json};
use tokio::process::Command;
use tokio::time::{Duration, timeout};

use crate::args::PingArgs;
use crate::error::{Result, ToolError};

const PROBE_COUNT: &str = "4";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const OUTPUT_CLIP: usize = 500;

pub async fn ping_host(args: PingArgs) -> Result<Value> {
    let hostname = args.hostname.trim().to_string();
    if hostname.is_empty() {
        return Err(ToolError::InvalidArguments("hostname is empty".to_string()));
    }

    let output = timeout(PROBE_TIMEOUT, probe_command(&hostname).output())
        .await
        .map_err(|_| ToolError::Timeout)?
        .map_err(|e| ToolError::Execution(format!("Failed to run ping: {}", e)))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report = parse_probe_output(&stdout, output.status.success());
    Ok(report.to_json(&hostname, &stdout))
}

#[cfg(target_os = "windows")]
fn probe_command(hostname: &str) -> Command {
    let mut cmd = Command::new("ping");
    cmd.args(["-n", PROBE_COUNT, "-w", "5000", hostname]);
    cmd.kill_on_drop(true);
    cmd
}

#[cfg(not(target_os = "windows"))]
fn probe_command(hostname: &str) -> Command {
    let mut cmd = Command::new("ping");
    cmd.args(["-c", PROBE_COUNT, "-W", "5", hostname]);
    cmd.kill_on_drop(true);
    cmd
}

#[derive(Debug, PartialEq)]
struct ProbeReport {
    packet_loss_percent: u32,
    avg_latency_ms: Option<f64>,
}

/// Pull loss and latency out of ping's text. The loss line is shared
/// across platforms; latency comes in two dialects (`min/avg/max` on
/// Unix-likes, `Average = Nms` on Windows). When no loss figure parses,
/// the exit status decides: clean exit means all replies came back.
fn parse_probe_output(output: &str, clean_exit: bool) -> ProbeReport {
    let fallback = if clean_exit { 0 } else { 100 };
    let packet_loss_percent = capture_u32(r"(\d+)% packet loss", output).unwrap_or(fallback);

    let avg_latency_ms = capture_f64(r"(?i)min/avg/max[^=]*=\s*[\d.]+/([\d.]+)/", output)
        .or_else(|| capture_f64(r"(?i)average\s*=\s*([\d.]+)\s*ms", output));

    ProbeReport {
        packet_loss_percent,
        avg_latency_ms,
    }
}

impl ProbeReport {
    fn to_json(&self, hostname: &str, raw_output: &str) -> Value {
        let reachable = self.packet_loss_percent < 100;
        json!({
            "hostname": hostname,
            "packet_loss_percent": self.packet_loss_percent,
            "avg_latency_ms": self.avg_latency_ms,
            "is_success": reachable,
            "status": if reachable { "Host Reachable" } else { "Host Unreachable" },
            "output": clip(raw_output, OUTPUT_CLIP),
        })
    }
}

fn capture_u32(pattern: &str, text: &str) -> Option<u32> {
    let re = regex::Regex::new(pattern).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn capture_f64(pattern: &str, text: &str) -> Option<f64> {
    let re = regex::Regex::new(pattern).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn clip(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_OUTPUT: &str = "\
PING google.com (142.250.72.14) 56(84) bytes of data.
64 bytes from lax17s51: icmp_seq=1 ttl=115 time=14.5 ms

--- google.com ping statistics ---
4 packets transmitted, 4 received, 0% packet loss, time 3004ms
rtt min/avg/max/mdev = 14.511/15.246/16.103/0.612 ms
";

    const WINDOWS_OUTPUT: &str = "\
Pinging google.com [142.250.72.14] with 32 bytes of data:
Reply from 142.250.72.14: bytes=32 time=15ms TTL=115

Ping statistics for 142.250.72.14:
    Packets: Sent = 4, Received = 4, Lost = 0 (0% loss),
Approximate round trip times in milli-seconds:
    Minimum = 14ms, Maximum = 16ms, Average = 15ms
";

    #[test]
    fn test_parse_linux_dialect() {
        let report = parse_probe_output(LINUX_OUTPUT, true);
        assert_eq!(report.packet_loss_percent, 0);
        assert_eq!(report.avg_latency_ms, Some(15.246));
    }

    #[test]
    fn test_parse_windows_dialect() {
        // The Windows loss line says "(0% loss)", not "packet loss", so the
        // clean exit supplies the zero.
        let report = parse_probe_output(WINDOWS_OUTPUT, true);
        assert_eq!(report.packet_loss_percent, 0);
        assert_eq!(report.avg_latency_ms, Some(15.0));
    }

    #[test]
    fn test_total_loss_beats_exit_status() {
        let output = "4 packets transmitted, 0 received, 100% packet loss, time 3100ms\n";
        let report = parse_probe_output(output, true);
        assert_eq!(report.packet_loss_percent, 100);
        assert_eq!(report.avg_latency_ms, None);
    }

    #[test]
    fn test_unparseable_failure_defaults_to_full_loss() {
        let report = parse_probe_output("ping: unknown host nowhere.invalid\n", false);
        assert_eq!(report.packet_loss_percent, 100);
    }

    #[test]
    fn test_report_json_shape() {
        let ok = ProbeReport {
            packet_loss_percent: 0,
            avg_latency_ms: Some(15.2),
        }
        .to_json("google.com", "raw");
        assert_eq!(ok["is_success"], true);
        assert_eq!(ok["status"], "Host Reachable");
        assert_eq!(ok["avg_latency_ms"], 15.2);

        let down = ProbeReport {
            packet_loss_percent: 100,
            avg_latency_ms: None,
        }
        .to_json("nowhere.invalid", "raw");
        assert_eq!(down["is_success"], false);
        assert_eq!(down["status"], "Host Unreachable");
        assert_eq!(down["avg_latency_ms"], Value::Null);
    }

    #[test]
    fn test_output_clipped() {
        let long = "x".repeat(800);
        let report = parse_probe_output(&long, true);
        let json = report.to_json("host", &long);
        assert_eq!(json["output"].as_str().unwrap().len(), OUTPUT_CLIP);
    }

    #[tokio::test]
    async fn test_blank_hostname_rejected_without_probe() {
        let err = ping_host(PingArgs {
            hostname: "  ".to_string(),
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
