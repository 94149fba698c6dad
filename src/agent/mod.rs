//! Node agent: the uniform per-node status/control service
//!
//! One instance runs on each managed node. It answers status queries and
//! executes administrative actions scoped strictly to that node, guarded
//! by a bearer credential. Routes for capabilities the agent does not
//! declare are never mounted.

pub mod gps;
pub mod handlers;
pub mod status;
pub mod systemd;

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::auth::{TokenGuard, require_token};
use crate::config::AgentConfig;
use crate::nodes::Capability;
use crate::{Error, Result};

use systemd::ServiceManager;

/// Shared state for agent handlers
pub struct AgentState {
    pub token: Option<String>,
    pub caps: BTreeSet<Capability>,
    /// Allow-list: the only units the service manager may be asked about
    pub units: Vec<String>,
    pub ping_target: String,
    pub gps_url: Option<String>,
    pub manager: Arc<dyn ServiceManager>,
    /// The location-updates flag; meaningful only on the toggle owner
    pub toggle: RwLock<bool>,
    pub http: reqwest::Client,
}

impl AgentState {
    #[must_use]
    pub fn new(config: AgentConfig, manager: Arc<dyn ServiceManager>) -> Self {
        Self {
            token: config.token,
            caps: config.caps,
            units: config.units,
            ping_target: config.ping_target,
            gps_url: config.gps_url,
            manager,
            toggle: RwLock::new(false),
            http: reqwest::Client::new(),
        }
    }
}

impl TokenGuard for AgentState {
    fn expected_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Liveness response
#[derive(serde::Serialize)]
struct Healthz {
    ok: bool,
    version: &'static str,
}

async fn healthz() -> Json<Healthz> {
    Json(Healthz {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the agent router for the declared capability set
#[must_use]
pub fn router(state: Arc<AgentState>) -> Router {
    let mut api = Router::new().route("/api/status", get(handlers::get_status));

    if state.caps.contains(&Capability::Service) {
        api = api.route(
            "/api/service/{unit}/{action}",
            post(handlers::service_action),
        );
    }
    if state.caps.contains(&Capability::Power) {
        api = api.route("/api/power/{action}", post(handlers::power_action));
    }
    if state.caps.contains(&Capability::Toggle) {
        api = api.route(
            "/api/admin/updates",
            get(handlers::get_toggle).post(handlers::set_toggle),
        );
    }

    let api = api
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_token::<AgentState>,
        ))
        .with_state(state);

    Router::new()
        .merge(api)
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
}

/// Node agent HTTP server
pub struct AgentServer {
    state: Arc<AgentState>,
    port: u16,
}

impl AgentServer {
    #[must_use]
    pub fn new(config: AgentConfig, manager: Arc<dyn ServiceManager>, port: u16) -> Self {
        Self {
            state: Arc::new(AgentState::new(config, manager)),
            port,
        }
    }

    /// Run the agent server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or serve
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind agent server: {e}")))?;

        tracing::info!(
            port = self.port,
            caps = ?self.state.caps,
            units = ?self.state.units,
            "node agent listening"
        );

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| Error::Config(format!("agent server error: {e}")))?;

        Ok(())
    }
}
