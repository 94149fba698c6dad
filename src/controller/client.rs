//! HTTP client for talking to node agents
//!
//! Exactly one outbound attempt per call, authenticated with the target
//! node's own credential. Transport failures map to `Unreachable`; an
//! answer from the agent, success or not, is relayed in kind.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::nodes::{Node, StatusSnapshot};
use crate::{Error, Result};

/// What a node agent answered to a proxied command
#[derive(Debug, Clone, Serialize)]
pub struct ProxyReply {
    pub upstream_status: u16,
    pub body: Value,
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.upstream_status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(self.body)).into_response()
    }
}

/// Failure modes of one status poll; kept separate from [`Error`] because
/// aggregation degrades these per node instead of propagating them
#[derive(Debug)]
pub enum FetchError {
    Unreachable(String),
    Upstream { status: u16, detail: String },
}

#[derive(Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    status_timeout: Duration,
    control_timeout: Duration,
}

fn transport_detail(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connect failed: {e}")
    } else {
        e.to_string()
    }
}

fn truncated(s: &str) -> String {
    s.chars().take(500).collect()
}

impl AgentClient {
    #[must_use]
    pub fn new(status_timeout: Duration, control_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            status_timeout,
            control_timeout,
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder, node: &Node) -> reqwest::RequestBuilder {
        match &node.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Poll one node's status endpoint
    ///
    /// # Errors
    ///
    /// `Unreachable` for transport failures, `Upstream` when the agent
    /// answered with a non-success status
    pub async fn fetch_status(
        &self,
        node: &Node,
    ) -> std::result::Result<StatusSnapshot, FetchError> {
        let url = format!("{}/api/status", node.base_url);
        let response = self
            .authed(self.http.get(url), node)
            .timeout(self.status_timeout)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(transport_detail(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                detail: truncated(&detail),
            });
        }

        response
            .json::<StatusSnapshot>()
            .await
            .map_err(|e| FetchError::Unreachable(format!("invalid status payload: {e}")))
    }

    /// Forward one command to a node agent and relay whatever it answers
    ///
    /// # Errors
    ///
    /// Returns `Unreachable` only on transport failure; agent rejections
    /// come back as a [`ProxyReply`] carrying the upstream status
    pub async fn post(&self, node: &Node, path: &str, body: Option<&Value>) -> Result<ProxyReply> {
        let url = format!("{}{path}", node.base_url);
        let mut req = self
            .authed(self.http.post(url), node)
            .timeout(self.control_timeout);
        if let Some(json) = body {
            req = req.json(json);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Unreachable(transport_detail(&e)))?;

        Self::relay(response).await
    }

    /// Read one resource from a node agent and relay the answer
    ///
    /// # Errors
    ///
    /// Returns `Unreachable` on transport failure
    pub async fn get(&self, node: &Node, path: &str) -> Result<ProxyReply> {
        let url = format!("{}{path}", node.base_url);
        let response = self
            .authed(self.http.get(url), node)
            .timeout(self.status_timeout)
            .send()
            .await
            .map_err(|e| Error::Unreachable(transport_detail(&e)))?;

        Self::relay(response).await
    }

    async fn relay(response: reqwest::Response) -> Result<ProxyReply> {
        let upstream_status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text)
            .unwrap_or_else(|_| serde_json::json!({ "raw": truncated(&text) }));
        Ok(ProxyReply {
            upstream_status,
            body,
        })
    }
}
