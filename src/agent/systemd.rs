//! Service-manager access behind a trait seam
//!
//! All systemd interaction funnels through [`ServiceManager`] so handlers
//! can be exercised against recording fakes; the real implementation shells
//! out to `systemctl` with a bound on every invocation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;

use crate::nodes::{PowerAction, ServiceAction};

/// Outcome of one service-manager invocation
#[derive(Debug, Clone, Serialize)]
pub struct ExecResult {
    pub ok: bool,
    pub rc: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            rc: None,
            stdout: String::new(),
            stderr: detail.into(),
        }
    }
}

/// Local service-manager operations a node agent needs
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Whether `unit` is active, plus the raw state string
    async fn is_active(&self, unit: &str) -> (bool, String);

    /// Last few non-empty lines of the unit's status output
    async fn status_tail(&self, unit: &str) -> String;

    /// Run a service action on an allow-listed unit
    async fn service(&self, unit: &str, action: ServiceAction) -> ExecResult;

    /// Run a power action. Best-effort: the node may go down before the
    /// caller sees the acknowledgment.
    async fn power(&self, action: PowerAction) -> ExecResult;
}

/// systemd-backed implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct Systemd;

const QUERY_TIMEOUT: Duration = Duration::from_secs(3);
const SERVICE_TIMEOUT: Duration = Duration::from_secs(12);
// Power transitions kill this process; answer before that happens.
const POWER_TIMEOUT: Duration = Duration::from_secs(2);

async fn run_systemctl(args: &[&str], bound: Duration) -> ExecResult {
    let run = Command::new("systemctl").args(args).output();
    match tokio::time::timeout(bound, run).await {
        Ok(Ok(output)) => ExecResult {
            ok: output.status.success(),
            rc: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        },
        Ok(Err(e)) => ExecResult::failure(format!("systemctl spawn failed: {e}")),
        Err(_) => ExecResult::failure(format!("systemctl timed out after {}ms", bound.as_millis())),
    }
}

#[async_trait]
impl ServiceManager for Systemd {
    async fn is_active(&self, unit: &str) -> (bool, String) {
        let res = run_systemctl(&["is-active", unit], QUERY_TIMEOUT).await;
        let state = if res.stdout.is_empty() {
            res.stderr.clone()
        } else {
            res.stdout.clone()
        };
        (res.ok, state)
    }

    async fn status_tail(&self, unit: &str) -> String {
        let res = run_systemctl(
            &["status", unit, "--no-pager", "-n", "10"],
            QUERY_TIMEOUT,
        )
        .await;
        let text = if res.stdout.is_empty() {
            res.stderr
        } else {
            res.stdout
        };
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        lines
            .iter()
            .rev()
            .take(3)
            .rev()
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn service(&self, unit: &str, action: ServiceAction) -> ExecResult {
        run_systemctl(&[action.systemctl_verb(), unit], SERVICE_TIMEOUT).await
    }

    async fn power(&self, action: PowerAction) -> ExecResult {
        run_systemctl(&[action.systemctl_verb()], POWER_TIMEOUT).await
    }
}
