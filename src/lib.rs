//! Netpanel - control plane for a small fleet of Linux nodes
//!
//! Two roles share this crate: the controller (panel backend) that
//! aggregates fleet status and proxies commands, and the node agent that
//! runs on every managed node and does the actual work.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Panel frontend                  │
//! └──────────────────┬──────────────────────────┘
//!                    │ bearer token
//! ┌──────────────────▼──────────────────────────┐
//! │               Controller                     │
//! │   registry  │  summary fan-out  │  proxy    │
//! └────┬──────────────┬──────────────┬──────────┘
//!      │ per-node token│              │
//! ┌────▼─────┐  ┌─────▼────┐  ┌─────▼────┐
//! │  Agent    │  │  Agent    │  │  Agent    │
//! │ service   │  │ service   │  │ gps       │
//! │ power     │  │ power     │  │ toggle    │
//! └───────────┘  └───────────┘  └───────────┘
//! ```
//!
//! Agents never talk to each other; every hop is authenticated; a dead
//! node degrades its own entry in the summary and nothing else.

pub mod agent;
pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod nodes;
pub mod probe;

pub use config::{AgentConfig, ControllerConfig};
pub use error::{Error, Result};
pub use nodes::{
    Capability, Node, NodeRegistry, NodeStatus, PowerAction, ServiceAction, StatusSnapshot,
};
