//! Error types for netpanel

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for netpanel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the controller or a node agent
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or invalid credential; the request had no side effect
    #[error("missing or invalid credential")]
    Unauthorized,

    /// Node, unit, or action not known to configuration or the allow-list;
    /// rejected before any outbound call
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    /// Action outside the node's declared capability set; rejected locally
    #[error("node '{node}' does not support '{action}'")]
    CapabilityUnsupported { node: String, action: String },

    /// Network or timeout failure talking to a node; distinct from rejection
    #[error("node unreachable: {0}")]
    Unreachable(String),

    /// The node accepted the request but the underlying action failed
    #[error("action failed: {0}")]
    ActionFailed(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable code used in HTTP error bodies
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Unauthorized => "unauthorized",
            Self::UnknownTarget(_) => "unknown_target",
            Self::CapabilityUnsupported { .. } => "capability_unsupported",
            Self::Unreachable(_) => "unreachable",
            Self::ActionFailed(_) => "action_failed",
            Self::Io(_) | Self::Http(_) | Self::Serialization(_) => "internal",
        }
    }

    /// HTTP status this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnknownTarget(_) => StatusCode::NOT_FOUND,
            Self::CapabilityUnsupported { .. } => StatusCode::BAD_REQUEST,
            Self::Unreachable(_) => StatusCode::BAD_GATEWAY,
            Self::ActionFailed(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Http(_)
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        });
        (self.status(), body).into_response()
    }
}
