//! Outbound connectivity probe
//!
//! One ICMP echo via the system `ping` binary, bounded so a dead network
//! can never stall the caller. Used by agents for their own snapshot and
//! by the controller for the panel-side view of each node host.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;

use crate::nodes::PingReport;

/// Hard ceiling for one probe; `ping -W 1` should finish well inside it
const PROBE_CEILING: Duration = Duration::from_secs(2);

fn latency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"time[=<]([0-9.]+)\s*ms").expect("latency pattern is valid"))
}

/// Parse the round-trip time out of iputils ping output
fn parse_latency(out: &str) -> Option<f64> {
    latency_re()
        .captures(out)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

fn truncated(s: &str) -> String {
    s.chars().take(200).collect()
}

/// Ping `target` once. Never fails: problems are reported in the result.
pub async fn ping(target: &str) -> PingReport {
    if which::which("ping").is_err() {
        return PingReport::failed(target, "ping binary not found");
    }

    let run = Command::new("ping")
        .args(["-c", "1", "-W", "1", target])
        .output();

    match tokio::time::timeout(PROBE_CEILING, run).await {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            if output.status.success() {
                PingReport {
                    ok: true,
                    target: target.to_string(),
                    latency_ms: parse_latency(&stdout),
                    detail: "ping ok".to_string(),
                }
            } else {
                let detail = if stderr.trim().is_empty() {
                    stdout.trim()
                } else {
                    stderr.trim()
                };
                let detail = if detail.is_empty() { "ping failed" } else { detail };
                PingReport::failed(target, truncated(detail))
            }
        }
        Ok(Err(e)) => PingReport::failed(target, format!("ping spawn failed: {e}")),
        Err(_) => PingReport::failed(
            target,
            format!("ping timed out after {}ms", PROBE_CEILING.as_millis()),
        ),
    }
}
