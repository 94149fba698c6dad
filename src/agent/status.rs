//! StatusSnapshot assembly
//!
//! Each sub-check carries its own bound; a slow or dead sub-check reports
//! unknown for its field instead of stalling or failing the response.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::nodes::{Capability, ServiceState, StatusSnapshot};
use crate::probe;

use super::AgentState;
use super::gps;

/// Build a fresh snapshot of this node. Read-only apart from the probes.
pub async fn snapshot(state: &AgentState) -> StatusSnapshot {
    let services = gather_services(state);
    let internet = probe::ping(&state.ping_target);
    let gps = async {
        match &state.gps_url {
            Some(url) => Some(gps::read_fix(&state.http, url).await),
            None => None,
        }
    };

    let (services, internet, gps) = tokio::join!(services, internet, gps);

    let map_updates = if state.caps.contains(&Capability::Toggle) {
        Some(*state.toggle.read().await)
    } else {
        None
    };

    StatusSnapshot {
        services,
        internet,
        gps,
        map_updates,
        server_time: Utc::now(),
    }
}

async fn gather_services(state: &AgentState) -> BTreeMap<String, ServiceState> {
    let checks = state.units.iter().map(|unit| async {
        let (active, unit_state) = state.manager.is_active(unit).await;
        let tail = state.manager.status_tail(unit).await;
        (
            unit.clone(),
            ServiceState {
                unit: unit.clone(),
                active,
                state: unit_state,
                tail,
            },
        )
    });
    futures::future::join_all(checks).await.into_iter().collect()
}
