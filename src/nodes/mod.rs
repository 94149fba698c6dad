//! Node descriptors, capability sets, and the controller-side registry

pub mod registry;
pub mod types;

pub use registry::NodeRegistry;
pub use types::{
    Capability, GpsFix, GpsReport, Node, NodeStatus, PingReport, PowerAction, ServiceAction,
    ServiceState, StatusSnapshot,
};
