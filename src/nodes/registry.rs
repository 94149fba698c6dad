//! Registry of configured nodes, keyed by node identity

use std::collections::BTreeMap;

use crate::{Error, Result};

use super::types::{Capability, Node};

/// Immutable set of nodes the controller manages.
///
/// Every proxied command resolves through here; a request that does not
/// name a configured node is rejected before any outbound call.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<String, Node>,
}

impl NodeRegistry {
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.key.clone(), n)).collect(),
        }
    }

    /// Look up a node by key
    ///
    /// # Errors
    ///
    /// Returns `UnknownTarget` if the key is not in configuration
    pub fn get(&self, key: &str) -> Result<&Node> {
        self.nodes
            .get(key)
            .ok_or_else(|| Error::UnknownTarget(format!("node '{key}' is not configured")))
    }

    /// Look up a node and verify it declares the given capability
    ///
    /// # Errors
    ///
    /// Returns `UnknownTarget` for an unconfigured key and
    /// `CapabilityUnsupported` when the node lacks the capability;
    /// both reject before any network traffic
    pub fn require(&self, key: &str, cap: Capability) -> Result<&Node> {
        let node = self.get(key)?;
        if node.supports(cap) {
            Ok(node)
        } else {
            Err(Error::CapabilityUnsupported {
                node: key.to_string(),
                action: cap.to_string(),
            })
        }
    }

    /// All configured nodes, in stable key order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
