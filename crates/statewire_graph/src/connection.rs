// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::node::NodeId;
use crate::port::PortId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One side of a connection: a port on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Owning node
    pub node: NodeId,
    /// Port on that node
    pub port: PortId,
}

impl Endpoint {
    /// Create an endpoint
    pub fn new(node: NodeId, port: PortId) -> Self {
        Self { node, port }
    }
}

/// Activation edge from an output port to a downstream input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Firing side
    pub from: Endpoint,
    /// Entered side
    pub to: Endpoint,
}

impl Connection {
    /// Create a new connection
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self {
            id: ConnectionId::new(),
            from,
            to,
        }
    }

    /// Check if this connection touches a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from.node == node_id || self.to.node == node_id
    }

    /// Check if this connection links the same two ports as `other`
    pub fn same_link(&self, other: &Connection) -> bool {
        self.from == other.from && self.to == other.to
    }
}
