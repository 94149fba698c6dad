//! Core types shared by the controller and node agents

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One control operation a node agent may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Start/stop/restart allow-listed service units
    Service,
    /// Reboot or shut down the node
    Power,
    /// Report a GPS fix in status snapshots
    Gps,
    /// Own the shared location-updates flag
    Toggle,
}

impl Capability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Power => "power",
            Self::Gps => "gps",
            Self::Toggle => "toggle",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "service" => Ok(Self::Service),
            "power" => Ok(Self::Power),
            "gps" => Ok(Self::Gps),
            "toggle" => Ok(Self::Toggle),
            other => Err(Error::Config(format!("unknown capability '{other}'"))),
        }
    }
}

/// Parse a comma-separated capability list (e.g. `service,power,toggle`)
pub fn parse_caps(raw: &str) -> crate::Result<BTreeSet<Capability>> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Administrative action on a service unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Status,
}

impl ServiceAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Status => "status",
        }
    }

    /// The systemctl verb implementing this action
    #[must_use]
    pub const fn systemctl_verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Status => "is-active",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "status" => Ok(Self::Status),
            other => Err(Error::UnknownTarget(format!(
                "invalid service action '{other}'"
            ))),
        }
    }
}

/// Power action on a node; irreversible once accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Reboot,
    Shutdown,
}

impl PowerAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::Shutdown => "shutdown",
        }
    }

    /// The systemctl verb implementing this action
    #[must_use]
    pub const fn systemctl_verb(self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::Shutdown => "poweroff",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reboot" => Ok(Self::Reboot),
            "shutdown" => Ok(Self::Shutdown),
            other => Err(Error::UnknownTarget(format!(
                "invalid power action '{other}'"
            ))),
        }
    }
}

/// Controller-side descriptor of one managed node.
///
/// Built from configuration at startup; immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Node {
    pub key: String,
    pub name: String,
    pub base_url: String,
    /// Bearer token for this node's agent; never logged
    pub token: Option<String>,
    pub caps: BTreeSet<Capability>,
}

impl Node {
    #[must_use]
    pub fn supports(&self, cap: Capability) -> bool {
        self.caps.contains(&cap)
    }

    /// Bare host extracted from the base URL, for ICMP probes
    #[must_use]
    pub fn host(&self) -> &str {
        let after_scheme = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        let authority = after_scheme.split('/').next().unwrap_or(after_scheme);
        authority.split(':').next().unwrap_or(authority)
    }
}

/// Result of one outbound ping probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingReport {
    pub ok: bool,
    pub target: String,
    pub latency_ms: Option<f64>,
    pub detail: String,
}

impl PingReport {
    #[must_use]
    pub fn failed(target: &str, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            target: target.to_string(),
            latency_ms: None,
            detail: detail.into(),
        }
    }
}

/// One GPS fix as published by the local position source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub speed_mps: Option<f64>,
    #[serde(default, alias = "numSV")]
    pub num_sv: Option<u32>,
    #[serde(default)]
    pub fix_ok: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// GPS sub-probe result; a failed or timed-out probe is reported as
/// unknown here rather than failing the whole snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpsReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<GpsFix>,
    pub detail: String,
}

/// State of one allow-listed service unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceState {
    pub unit: String,
    pub active: bool,
    pub state: String,
    #[serde(default)]
    pub tail: String,
}

/// One immutable, timestamped read of a node's health.
///
/// Recomputed on every poll; superseded, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub services: BTreeMap<String, ServiceState>,
    pub internet: PingReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_updates: Option<bool>,
    pub server_time: DateTime<Utc>,
}

/// Per-node entry in the aggregated view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum NodeStatus {
    /// Agent answered within its timeout
    Ok {
        latency_ms: f64,
        snapshot: StatusSnapshot,
    },
    /// Connect failure or timeout; distinct from a rejection
    Unreachable { reason: String },
    /// Agent answered with a non-success status
    Error { status: u16, detail: String },
}
