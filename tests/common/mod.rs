//! Shared test utilities
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;

use netpanel::agent::systemd::{ExecResult, ServiceManager};
use netpanel::agent::{AgentState, router as agent_router};
use netpanel::controller::{ControllerState, router as controller_router};
use netpanel::{AgentConfig, Capability, ControllerConfig, Node};

pub const AGENT_TOKEN: &str = "agent-token";
pub const OPERATOR_TOKEN: &str = "operator-token";

/// Service manager fake that records invocations; succeeds unless built
/// with `failing()`
#[derive(Default)]
pub struct RecordingManager {
    pub service_calls: AtomicUsize,
    pub power_calls: AtomicUsize,
    fail: bool,
}

impl RecordingManager {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn service_count(&self) -> usize {
        self.service_calls.load(Ordering::SeqCst)
    }

    pub fn power_count(&self) -> usize {
        self.power_calls.load(Ordering::SeqCst)
    }

    fn result(&self, stdout: String) -> ExecResult {
        if self.fail {
            ExecResult {
                ok: false,
                rc: Some(1),
                stdout: String::new(),
                stderr: "unit entered failed state".to_string(),
            }
        } else {
            ExecResult {
                ok: true,
                rc: Some(0),
                stdout,
                stderr: String::new(),
            }
        }
    }
}

#[async_trait]
impl ServiceManager for RecordingManager {
    async fn is_active(&self, _unit: &str) -> (bool, String) {
        (true, "active".to_string())
    }

    async fn status_tail(&self, unit: &str) -> String {
        format!("{unit}: running")
    }

    async fn service(&self, unit: &str, _action: netpanel::ServiceAction) -> ExecResult {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        self.result(format!("{unit} ok"))
    }

    async fn power(&self, _action: netpanel::PowerAction) -> ExecResult {
        self.power_calls.fetch_add(1, Ordering::SeqCst);
        self.result(String::new())
    }
}

/// Agent configuration for tests; loopback ping keeps probes fast
pub fn test_agent_config(caps: &[Capability], units: &[&str]) -> AgentConfig {
    AgentConfig {
        token: Some(AGENT_TOKEN.to_string()),
        caps: caps.iter().copied().collect(),
        units: units.iter().map(ToString::to_string).collect(),
        ping_target: "127.0.0.1".to_string(),
        gps_url: None,
    }
}

/// Build an agent router over a recording manager, returning both
pub fn test_agent(caps: &[Capability], units: &[&str]) -> (Router, Arc<RecordingManager>) {
    test_agent_with(RecordingManager::default(), caps, units)
}

/// Build an agent router over the given manager
pub fn test_agent_with(
    manager: RecordingManager,
    caps: &[Capability],
    units: &[&str],
) -> (Router, Arc<RecordingManager>) {
    let manager = Arc::new(manager);
    let state = Arc::new(AgentState::new(test_agent_config(caps, units), manager.clone()));
    (agent_router(state), manager)
}

/// Serve a router on an ephemeral loopback port
pub async fn spawn_router(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    addr
}

async fn count_hit(State(hits): State<Arc<AtomicUsize>>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

/// Router that answers 200 to anything and counts how often it was hit
pub fn counting_sink() -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().fallback(count_hit).with_state(hits.clone());
    (app, hits)
}

pub fn test_node(key: &str, addr: SocketAddr, caps: &[Capability]) -> Node {
    Node {
        key: key.to_string(),
        name: key.to_string(),
        base_url: format!("http://{addr}"),
        token: Some(AGENT_TOKEN.to_string()),
        caps: caps.iter().copied().collect(),
    }
}

pub fn test_node_at(key: &str, base_url: &str, caps: &[Capability]) -> Node {
    Node {
        key: key.to_string(),
        name: key.to_string(),
        base_url: base_url.to_string(),
        token: Some(AGENT_TOKEN.to_string()),
        caps: caps.iter().copied().collect(),
    }
}

/// Build a controller router over the given nodes
pub fn test_controller(nodes: Vec<Node>, status_timeout: Duration) -> Router {
    let config = ControllerConfig {
        operator_token: Some(OPERATOR_TOKEN.to_string()),
        nodes,
        ping_target: "127.0.0.1".to_string(),
        status_timeout,
        control_timeout: Duration::from_secs(2),
    };
    controller_router(Arc::new(ControllerState::new(config)))
}
