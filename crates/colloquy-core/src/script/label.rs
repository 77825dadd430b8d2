//! Node labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node as a `(flow, node)` pair of stable string keys.
///
/// Nodes reference each other by label rather than by embedded references,
/// so cyclic scripts (including self-loops) are ordinary map lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Name of the flow the node belongs to.
    pub flow: String,
    /// Name of the node within the flow.
    pub node: String,
}

impl Label {
    /// Creates a label from flow and node names.
    pub fn new(flow: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            flow: flow.into(),
            node: node.into(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.flow, self.node)
    }
}
