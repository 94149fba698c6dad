//! Command proxying to node agents
//!
//! Validation happens locally first: unknown node keys and undeclared
//! capabilities are rejected before anything leaves the controller, so a
//! misrouted command never costs a network round trip. Accepted commands
//! are forwarded exactly once and the agent's answer is relayed verbatim.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::json;

use crate::Result;
use crate::nodes::{Capability, PowerAction, ServiceAction};

use super::ControllerState;
use super::client::ProxyReply;

/// `POST /api/node/{node}/service/{unit}/{action}`
pub async fn service(
    State(state): State<Arc<ControllerState>>,
    Path((node_key, unit, action)): Path<(String, String, String)>,
) -> Result<ProxyReply> {
    let action: ServiceAction = action.parse()?;
    let node = state.registry.require(&node_key, Capability::Service)?;

    tracing::info!(node = %node.key, %unit, %action, "forwarding service action");
    state
        .client
        .post(node, &format!("/api/service/{unit}/{action}"), None)
        .await
}

/// `POST /api/node/{node}/power/{action}`
pub async fn power(
    State(state): State<Arc<ControllerState>>,
    Path((node_key, action)): Path<(String, String)>,
) -> Result<ProxyReply> {
    let action: PowerAction = action.parse()?;
    let node = state.registry.require(&node_key, Capability::Power)?;

    tracing::info!(node = %node.key, %action, "forwarding power action");
    state
        .client
        .post(node, &format!("/api/power/{action}"), None)
        .await
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// `GET /api/node/{node}/updates`
pub async fn get_toggle(
    State(state): State<Arc<ControllerState>>,
    Path(node_key): Path<String>,
) -> Result<ProxyReply> {
    let node = state.registry.require(&node_key, Capability::Toggle)?;
    state.client.get(node, "/api/admin/updates").await
}

/// `POST /api/node/{node}/updates`
pub async fn set_toggle(
    State(state): State<Arc<ControllerState>>,
    Path(node_key): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> Result<ProxyReply> {
    let node = state.registry.require(&node_key, Capability::Toggle)?;

    tracing::info!(node = %node.key, enabled = req.enabled, "forwarding toggle write");
    state
        .client
        .post(
            node,
            "/api/admin/updates",
            Some(&json!({ "enabled": req.enabled })),
        )
        .await
}
