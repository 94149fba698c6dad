//! Configuration for the controller and node agents
//!
//! Everything is read from the environment once at process start; there is
//! no hot reload. Credential resolution (shared admin token vs per-node
//! tokens) happens entirely here, so the rest of the code never branches
//! on the token topology.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::nodes::types::parse_caps;
use crate::nodes::{Capability, Node};
use crate::{Error, Result};

const DEFAULT_PING_TARGET: &str = "1.1.1.1";
const DEFAULT_GPS_URL: &str = "http://127.0.0.1:8000/api/location";
const DEFAULT_STATUS_TIMEOUT_MS: u64 = 2500;
const DEFAULT_CONTROL_TIMEOUT_MS: u64 = 8000;

/// Node agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Bearer token required on every request; `None` means unauthenticated
    /// development mode (logged as a warning)
    pub token: Option<String>,
    /// Capabilities this agent exposes; routes for undeclared capabilities
    /// are not mounted at all
    pub caps: BTreeSet<Capability>,
    /// Service units this agent is allowed to control and report on
    pub units: Vec<String>,
    /// Outbound connectivity probe target
    pub ping_target: String,
    /// Local fix source, present only for gps-capable agents
    pub gps_url: Option<String>,
}

impl AgentConfig {
    /// Load agent configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns `Config` if `NETPANEL_AGENT_CAPS` contains an unknown
    /// capability name
    pub fn from_env() -> Result<Self> {
        let caps = match env_opt("NETPANEL_AGENT_CAPS") {
            Some(raw) => parse_caps(&raw)?,
            None => [Capability::Service, Capability::Power].into_iter().collect(),
        };

        let gps_url = caps.contains(&Capability::Gps).then(|| {
            env_opt("NETPANEL_GPS_URL").unwrap_or_else(|| DEFAULT_GPS_URL.to_string())
        });

        Ok(Self {
            token: env_opt("NETPANEL_ADMIN_TOKEN"),
            caps,
            units: split_list(&env_opt("NETPANEL_UNITS").unwrap_or_default()),
            ping_target: env_opt("NETPANEL_PING_TARGET")
                .unwrap_or_else(|| DEFAULT_PING_TARGET.to_string()),
            gps_url,
        })
    }
}

/// Controller (panel backend) configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Operator bearer token; `None` means unauthenticated development mode
    pub operator_token: Option<String>,
    /// Managed nodes with resolved credentials and capability sets
    pub nodes: Vec<Node>,
    /// Outbound connectivity probe target for the panel itself
    pub ping_target: String,
    /// Independent per-node budget for one status poll
    pub status_timeout: Duration,
    /// Budget for one proxied control action
    pub control_timeout: Duration,
}

impl ControllerConfig {
    /// Load controller configuration from the environment
    ///
    /// Nodes come from `NETPANEL_NODES` (`key=base_url` pairs, comma
    /// separated). Per node, `NETPANEL_NODE_TOKEN_<KEY>` overrides the
    /// shared `NETPANEL_ADMIN_TOKEN`, `NETPANEL_NODE_CAPS_<KEY>` overrides
    /// the default `service,power` set, and `NETPANEL_NODE_NAME_<KEY>`
    /// overrides the display name.
    ///
    /// # Errors
    ///
    /// Returns `Config` when `NETPANEL_NODES` is missing or malformed
    pub fn from_env() -> Result<Self> {
        let raw_nodes = env_opt("NETPANEL_NODES")
            .ok_or_else(|| Error::Config("NETPANEL_NODES is not set".to_string()))?;
        let admin_token = env_opt("NETPANEL_ADMIN_TOKEN");

        let mut nodes = Vec::new();
        for (key, base_url) in parse_node_spec(&raw_nodes)? {
            let suffix = env_suffix(&key);
            let caps = match env_opt(&format!("NETPANEL_NODE_CAPS_{suffix}")) {
                Some(raw) => parse_caps(&raw)?,
                None => [Capability::Service, Capability::Power].into_iter().collect(),
            };
            nodes.push(Node {
                name: env_opt(&format!("NETPANEL_NODE_NAME_{suffix}"))
                    .unwrap_or_else(|| key.clone()),
                token: env_opt(&format!("NETPANEL_NODE_TOKEN_{suffix}"))
                    .or_else(|| admin_token.clone()),
                base_url,
                caps,
                key,
            });
        }

        Ok(Self {
            operator_token: admin_token,
            nodes,
            ping_target: env_opt("NETPANEL_PING_TARGET")
                .unwrap_or_else(|| DEFAULT_PING_TARGET.to_string()),
            status_timeout: env_duration_ms("NETPANEL_STATUS_TIMEOUT_MS", DEFAULT_STATUS_TIMEOUT_MS)?,
            control_timeout: env_duration_ms(
                "NETPANEL_CONTROL_TIMEOUT_MS",
                DEFAULT_CONTROL_TIMEOUT_MS,
            )?,
        })
    }
}

/// Parse `key=base_url` pairs from a comma-separated list
fn parse_node_spec(raw: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for entry in raw.split(',').filter(|s| !s.trim().is_empty()) {
        let (key, url) = entry
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("node entry '{entry}' is not key=base_url")))?;
        let key = key.trim();
        let url = url.trim().trim_end_matches('/');
        if key.is_empty() || url.is_empty() {
            return Err(Error::Config(format!(
                "node entry '{entry}' has an empty key or url"
            )));
        }
        out.push((key.to_string(), url.to_string()));
    }
    if out.is_empty() {
        return Err(Error::Config("NETPANEL_NODES lists no nodes".to_string()));
    }
    Ok(out)
}

/// Env-var suffix for a node key (`webserver-a` -> `WEBSERVER_A`)
fn env_suffix(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_duration_ms(key: &str, default_ms: u64) -> Result<Duration> {
    let ms = match env_opt(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| Error::Config(format!("{key} must be an integer millisecond count")))?,
        None => default_ms,
    };
    Ok(Duration::from_millis(ms))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
