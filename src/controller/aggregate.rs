//! Fleet status aggregation
//!
//! All nodes are polled concurrently, each under its own timeout, so one
//! dead node costs at most one timeout rather than stalling the whole
//! summary. A degraded node stays in the map with its failure reason.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::nodes::{Capability, Node, NodeStatus, PingReport};
use crate::probe;

use super::ControllerState;
use super::client::FetchError;

/// Aggregated view over the whole fleet
#[derive(Debug, Serialize)]
pub struct Summary {
    pub server_time: DateTime<Utc>,
    /// Panel's own outbound connectivity
    pub internet: PingReport,
    pub nodes: BTreeMap<String, NodeReport>,
}

/// One node's entry in the summary
#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub base_url: String,
    pub caps: Vec<Capability>,
    /// ICMP reachability as seen from the panel host
    pub panel_ping: PingReport,
    pub agent: NodeStatus,
}

/// Build a fresh summary. Always answers, however many nodes are down.
pub async fn summary(state: &ControllerState) -> Summary {
    let internet = probe::ping(&state.ping_target);
    let polls = futures::future::join_all(state.registry.iter().map(|node| poll_node(state, node)));

    let (internet, polls) = tokio::join!(internet, polls);

    Summary {
        server_time: Utc::now(),
        internet,
        nodes: polls.into_iter().collect(),
    }
}

async fn poll_node(state: &ControllerState, node: &Node) -> (String, NodeReport) {
    let panel_ping = probe::ping(node.host());
    let agent = async {
        let started = Instant::now();
        match state.client.fetch_status(node).await {
            Ok(snapshot) => NodeStatus::Ok {
                latency_ms: started.elapsed().as_secs_f64() * 1000.0,
                snapshot,
            },
            Err(FetchError::Unreachable(reason)) => NodeStatus::Unreachable { reason },
            Err(FetchError::Upstream { status, detail }) => NodeStatus::Error { status, detail },
        }
    };

    let (panel_ping, agent) = tokio::join!(panel_ping, agent);

    match &agent {
        NodeStatus::Ok { .. } => {}
        NodeStatus::Unreachable { reason } => {
            tracing::warn!(node = %node.key, %reason, "node unreachable during poll");
        }
        NodeStatus::Error { status, .. } => {
            tracing::warn!(node = %node.key, status, "node answered poll with an error");
        }
    }

    (
        node.key.clone(),
        NodeReport {
            name: node.name.clone(),
            base_url: node.base_url.clone(),
            caps: node.caps.iter().copied().collect(),
            panel_ping,
            agent,
        },
    )
}
