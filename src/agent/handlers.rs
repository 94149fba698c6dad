//! Node agent HTTP handlers
//!
//! Every handler runs behind the bearer-token middleware; validation
//! (allow-list, action names) happens before the service manager is
//! touched, and an unknown unit or action is rejected with a distinct
//! error rather than silently ignored.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::nodes::{PowerAction, ServiceAction, StatusSnapshot};
use crate::{Error, Result};

use super::AgentState;
use super::status;
use super::systemd::ExecResult;

/// Result of one accepted service or power action, relayed to the
/// controller as-is; failures travel as `action_failed` errors instead
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub ok: bool,
    pub target: String,
    pub action: String,
    pub rc: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

fn failure_detail(result: &ExecResult) -> String {
    if !result.stderr.is_empty() {
        result.stderr.clone()
    } else if !result.stdout.is_empty() {
        result.stdout.clone()
    } else {
        format!("exited with code {:?}", result.rc)
    }
}

/// `GET /api/status`
pub async fn get_status(State(state): State<Arc<AgentState>>) -> Json<StatusSnapshot> {
    Json(status::snapshot(&state).await)
}

/// `POST /api/service/{unit}/{action}`
pub async fn service_action(
    State(state): State<Arc<AgentState>>,
    Path((unit, action)): Path<(String, String)>,
) -> Result<Json<ActionResponse>> {
    let action: ServiceAction = action.parse()?;

    // Only units we expose in /api/status may be controlled; anything else
    // never reaches the service manager.
    if !state.units.iter().any(|u| u == &unit) {
        tracing::warn!(%unit, %action, "rejected action for unit not on allow-list");
        return Err(Error::UnknownTarget(format!("unit '{unit}' is not permitted")));
    }

    let result = state.manager.service(&unit, action).await;
    if !result.ok {
        tracing::warn!(%unit, %action, rc = ?result.rc, "service action failed");
        return Err(Error::ActionFailed(failure_detail(&result)));
    }
    tracing::info!(%unit, %action, "service action executed");

    Ok(Json(ActionResponse {
        ok: true,
        target: unit,
        action: action.to_string(),
        rc: result.rc,
        stdout: result.stdout,
        stderr: result.stderr,
    }))
}

/// `POST /api/power/{action}`
///
/// Best-effort acknowledgment: on success the node is about to go down and
/// the response may never be observed by the caller.
pub async fn power_action(
    State(state): State<Arc<AgentState>>,
    Path(action): Path<String>,
) -> Result<Json<ActionResponse>> {
    let action: PowerAction = action.parse()?;

    let result = state.manager.power(action).await;
    if !result.ok {
        tracing::warn!(%action, rc = ?result.rc, "power action failed");
        return Err(Error::ActionFailed(failure_detail(&result)));
    }
    tracing::info!(%action, "power action executed");

    Ok(Json(ActionResponse {
        ok: true,
        target: "system".to_string(),
        action: action.to_string(),
        rc: result.rc,
        stdout: result.stdout,
        stderr: result.stderr,
    }))
}

/// Current value of the location-updates flag
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}

/// Write request for the flag
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// `GET /api/admin/updates` (toggle owner only)
pub async fn get_toggle(State(state): State<Arc<AgentState>>) -> Json<ToggleResponse> {
    Json(ToggleResponse {
        enabled: *state.toggle.read().await,
    })
}

/// `POST /api/admin/updates` (toggle owner only); last write wins
pub async fn set_toggle(
    State(state): State<Arc<AgentState>>,
    Json(req): Json<ToggleRequest>,
) -> Json<ToggleResponse> {
    *state.toggle.write().await = req.enabled;
    tracing::info!(enabled = req.enabled, "location updates toggled");
    Json(ToggleResponse {
        enabled: req.enabled,
    })
}
