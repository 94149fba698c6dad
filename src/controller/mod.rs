//! Controller: the panel backend
//!
//! Holds the node registry, aggregates fleet status, and proxies
//! administrative commands to the right agent with that node's own
//! credential. Never executes anything locally beyond its own ping probe.

pub mod aggregate;
pub mod client;
pub mod proxy;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{TokenGuard, require_token};
use crate::config::ControllerConfig;
use crate::nodes::{Capability, NodeRegistry};
use crate::{Error, Result};

use client::AgentClient;

/// Shared state for controller handlers
pub struct ControllerState {
    pub registry: NodeRegistry,
    pub client: AgentClient,
    pub operator_token: Option<String>,
    pub ping_target: String,
}

impl ControllerState {
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            registry: NodeRegistry::new(config.nodes),
            client: AgentClient::new(config.status_timeout, config.control_timeout),
            operator_token: config.operator_token,
            ping_target: config.ping_target,
        }
    }
}

impl TokenGuard for ControllerState {
    fn expected_token(&self) -> Option<&str> {
        self.operator_token.as_deref()
    }
}

/// What the panel frontend needs to render itself
#[derive(Debug, Serialize)]
struct ConfigInfo {
    nodes: BTreeMap<String, ConfigNode>,
    ping_target: String,
    control_requires_token: bool,
}

#[derive(Debug, Serialize)]
struct ConfigNode {
    name: String,
    base_url: String,
    caps: Vec<Capability>,
}

/// `GET /api/config`; tokens are deliberately absent from this view
async fn get_config(State(state): State<Arc<ControllerState>>) -> Json<ConfigInfo> {
    let nodes = state
        .registry
        .iter()
        .map(|node| {
            (
                node.key.clone(),
                ConfigNode {
                    name: node.name.clone(),
                    base_url: node.base_url.clone(),
                    caps: node.caps.iter().copied().collect(),
                },
            )
        })
        .collect();

    Json(ConfigInfo {
        nodes,
        ping_target: state.ping_target.clone(),
        control_requires_token: state.operator_token.is_some(),
    })
}

/// `GET /api/summary`
async fn get_summary(State(state): State<Arc<ControllerState>>) -> Json<aggregate::Summary> {
    Json(aggregate::summary(&state).await)
}

#[derive(Serialize)]
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

/// Build the controller router
#[must_use]
pub fn router(state: Arc<ControllerState>) -> Router {
    let api = Router::new()
        .route("/api/config", get(get_config))
        .route("/api/summary", get(get_summary))
        .route(
            "/api/node/{node}/service/{unit}/{action}",
            post(proxy::service),
        )
        .route("/api/node/{node}/power/{action}", post(proxy::power))
        .route(
            "/api/node/{node}/updates",
            get(proxy::get_toggle).post(proxy::set_toggle),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_token::<ControllerState>,
        ))
        .with_state(state);

    Router::new()
        .merge(api)
        .route("/healthz", get(healthz))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Controller HTTP server
pub struct ControllerServer {
    state: Arc<ControllerState>,
    port: u16,
}

impl ControllerServer {
    #[must_use]
    pub fn new(config: ControllerConfig, port: u16) -> Self {
        Self {
            state: Arc::new(ControllerState::new(config)),
            port,
        }
    }

    /// Run the controller server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or serve
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind controller server: {e}")))?;

        tracing::info!(
            port = self.port,
            nodes = self.state.registry.len(),
            "controller listening"
        );

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| Error::Config(format!("controller server error: {e}")))?;

        Ok(())
    }
}
