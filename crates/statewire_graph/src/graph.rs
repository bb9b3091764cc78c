// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing state nodes and activation wiring.

use crate::connection::{Connection, ConnectionId, Endpoint};
use crate::node::{Lifecycle, NodeId, NodeStatus, StateNode};
use crate::port::{PortId, ENTER_PORT};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A state node graph.
///
/// Node and connection maps keep insertion order, which is also the order
/// signals are delivered in and connections fire in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, StateNode>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: StateNode) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its connections
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<StateNode> {
        self.connections.retain(|_, c| !c.involves_node(node_id));
        // shift_remove keeps the delivery order of the remaining nodes
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&StateNode> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut StateNode> {
        self.nodes.get_mut(&node_id)
    }

    /// Find a node by name
    pub fn find_node(&self, name: &str) -> Option<&StateNode> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Connect an output port to a downstream input port
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<ConnectionId, GraphError> {
        let source_node = self.nodes.get(&from_node)
            .ok_or(GraphError::NodeNotFound(from_node))?;
        let target_node = self.nodes.get(&to_node)
            .ok_or(GraphError::NodeNotFound(to_node))?;

        let source_port = source_node.port(&from_port)
            .ok_or(GraphError::PortNotFound(from_port))?;
        let target_port = target_node.port(&to_port)
            .ok_or(GraphError::PortNotFound(to_port))?;

        if !source_port.can_connect(target_port) {
            return Err(GraphError::IncompatiblePorts);
        }

        if from_node == to_node {
            return Err(GraphError::SelfLoop(from_node));
        }

        let connection = Connection::new(
            Endpoint::new(from_node, from_port),
            Endpoint::new(to_node, to_port),
        );
        if self.connections.values().any(|c| c.same_link(&connection)) {
            return Err(GraphError::DuplicateConnection);
        }

        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Connect the output named `port` on `from_node` to the `enter` input
    /// of `to_node`
    pub fn connect_named(
        &mut self,
        from_node: NodeId,
        port: &str,
        to_node: NodeId,
    ) -> Result<ConnectionId, GraphError> {
        let source = self.nodes.get(&from_node)
            .ok_or(GraphError::NodeNotFound(from_node))?;
        let target = self.nodes.get(&to_node)
            .ok_or(GraphError::NodeNotFound(to_node))?;

        let from_port = source.output_named(port)
            .ok_or_else(|| GraphError::PortNameNotFound {
                node: source.name.clone(),
                port: port.to_string(),
            })?
            .id;
        let to_port = target.input_named(ENTER_PORT)
            .ok_or_else(|| GraphError::PortNameNotFound {
                node: target.name.clone(),
                port: ENTER_PORT.to_string(),
            })?
            .id;

        self.connect(from_node, from_port, to_node, to_port)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        self.connections.shift_remove(&connection_id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections from a specific output port, in declaration order
    pub fn connections_from(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.from.port == port_id)
    }

    /// Get connections to a specific input port
    pub fn connections_to(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.to.port == port_id)
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Check wiring that may have bypassed [`Graph::connect`], e.g. after
    /// deserialization.
    ///
    /// Rejects nodes whose ports disagree with their kind, connections whose
    /// endpoints no longer resolve or run the wrong way, and cycles made only
    /// of nodes that fire on entry, which would never settle.
    pub fn validate(&self) -> Result<(), GraphError> {
        if let Some(node) = self.nodes.values().find(|n| !n.has_expected_ports()) {
            return Err(GraphError::PortLayoutMismatch(node.name.clone()));
        }

        for connection in self.connections.values() {
            let resolve = |endpoint: &Endpoint| {
                self.nodes.get(&endpoint.node).and_then(|n| n.port(&endpoint.port))
            };
            let (Some(from), Some(to)) = (resolve(&connection.from), resolve(&connection.to)) else {
                return Err(GraphError::DanglingConnection(connection.id));
            };
            if !from.can_connect(to) {
                return Err(GraphError::IncompatiblePorts);
            }
            if connection.from.node == connection.to.node {
                return Err(GraphError::SelfLoop(connection.from.node));
            }
        }

        if let Some(cycle) = self.pass_through_cycle() {
            return Err(GraphError::PassThroughCycle(cycle));
        }
        Ok(())
    }

    /// Find a cycle consisting only of nodes that fire on entry.
    ///
    /// Returns the nodes on the cycle in traversal order.
    pub fn pass_through_cycle(&self) -> Option<Vec<NodeId>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for node in self.nodes.values() {
            if node.kind().behavior().fires_on_enter() && !visited.contains(&node.id) {
                if let Some(cycle) = self.visit(node.id, &mut visited, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        stack: &mut Vec<NodeId>,
    ) -> Option<Vec<NodeId>> {
        if let Some(pos) = stack.iter().position(|id| *id == node_id) {
            return Some(stack[pos..].to_vec());
        }
        if visited.contains(&node_id) {
            return None;
        }

        stack.push(node_id);

        for connection in self.connections_for_node(node_id) {
            if connection.from.node != node_id {
                continue;
            }
            let passes = self.nodes.get(&connection.to.node)
                .is_some_and(|n| n.kind().behavior().fires_on_enter());
            if passes {
                if let Some(cycle) = self.visit(connection.to.node, visited, stack) {
                    return Some(cycle);
                }
            }
        }

        stack.pop();
        visited.insert(node_id);
        None
    }

    /// Exit every node
    pub fn stop(&mut self) {
        for node in self.nodes.values_mut() {
            node.exit();
        }
    }

    /// Observable state of every node, in graph order
    pub fn snapshot(&self) -> Vec<NodeStatus> {
        self.nodes.values().map(StateNode::status).collect()
    }

    /// Drop a node but leave its connections behind
    #[cfg(test)]
    pub(crate) fn forget_node(&mut self, node_id: NodeId) {
        self.nodes.shift_remove(&node_id);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Invalid wiring
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// Named port not found on a node
    #[error("Node '{node}' has no port named '{port}'")]
    PortNameNotFound {
        /// Node name
        node: String,
        /// Requested port name
        port: String,
    },

    /// Node ports do not match the ones its kind defines
    #[error("Ports of node '{0}' do not match its kind")]
    PortLayoutMismatch(String),

    /// Connection does not go output -> input
    #[error("Incompatible port directions")]
    IncompatiblePorts,

    /// Node wired to itself
    #[error("Self-loop not allowed on node {0}")]
    SelfLoop(NodeId),

    /// Same two ports linked twice
    #[error("Ports are already connected")]
    DuplicateConnection,

    /// Connection endpoint no longer resolves
    #[error("Connection {0:?} points at a missing node or port")]
    DanglingConnection(ConnectionId),

    /// Cycle of nodes that fire on entry
    #[error("Pass-through cycle through {} nodes", .0.len())]
    PassThroughCycle(Vec<NodeId>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{ConditionNode, StringCompare, StringCondition};
    use crate::filter::SignalFilter;
    use crate::node::NodeKind;
    use crate::nodes::{ActionNode, Command};
    use crate::port::EXIT_PORT;

    fn action(name: &str) -> StateNode {
        StateNode::new(name, NodeKind::Action(ActionNode::new(Command::new(format!("/{name}/")))))
    }

    fn listener(name: &str) -> StateNode {
        StateNode::new(
            name,
            NodeKind::StringCondition(ConditionNode::new(
                SignalFilter::any(),
                vec![StringCondition::new(StringCompare::Contains, "go")],
            )),
        )
    }

    #[test]
    fn test_connect_named() {
        let mut graph = Graph::new("test");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let listen = graph.add_node(listener("listen"));

        let id = graph.connect_named(start, EXIT_PORT, listen).unwrap();
        let connection = graph.connection(id).unwrap();
        assert_eq!(connection.from.node, start);
        assert_eq!(connection.to.node, listen);
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_connect_rejects_bad_wiring() {
        let mut graph = Graph::new("test");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let listen = graph.add_node(listener("listen"));

        // Start has no input
        assert!(matches!(
            graph.connect_named(listen, "conditions 0", start),
            Err(GraphError::PortNameNotFound { .. })
        ));
        assert!(matches!(
            graph.connect_named(listen, "conditions 5", listen),
            Err(GraphError::PortNameNotFound { .. })
        ));
        assert_eq!(
            graph.connect_named(listen, "conditions 0", listen),
            Err(GraphError::SelfLoop(listen))
        );

        let missing = NodeId::new();
        assert_eq!(
            graph.connect_named(start, EXIT_PORT, missing),
            Err(GraphError::NodeNotFound(missing))
        );

        graph.connect_named(start, EXIT_PORT, listen).unwrap();
        assert_eq!(
            graph.connect_named(start, EXIT_PORT, listen),
            Err(GraphError::DuplicateConnection)
        );
    }

    #[test]
    fn test_connect_direction() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(listener("a"));
        let b = graph.add_node(listener("b"));
        let a_in = graph.node(a).unwrap().inputs()[0].id;
        let b_in = graph.node(b).unwrap().inputs()[0].id;

        assert_eq!(graph.connect(a, a_in, b, b_in), Err(GraphError::IncompatiblePorts));
    }

    #[test]
    fn test_remove_node_drops_connections() {
        let mut graph = Graph::new("test");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let listen = graph.add_node(listener("listen"));
        graph.connect_named(start, EXIT_PORT, listen).unwrap();

        assert!(graph.remove_node(listen).is_some());
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_fan_out_order() {
        let mut graph = Graph::new("test");
        let listen = graph.add_node(listener("listen"));
        let a = graph.add_node(action("a"));
        let b = graph.add_node(action("b"));
        graph.connect_named(listen, "conditions 0", b).unwrap();
        graph.connect_named(listen, "conditions 0", a).unwrap();

        let port = graph.node(listen).unwrap().outputs()[0].id;
        let targets: Vec<_> = graph.connections_from(port).map(|c| c.to.node).collect();
        assert_eq!(targets, vec![b, a]);
    }

    #[test]
    fn test_pass_through_cycle() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(action("a"));
        let b = graph.add_node(action("b"));
        graph.connect_named(a, EXIT_PORT, b).unwrap();
        assert!(graph.validate().is_ok());

        graph.connect_named(b, EXIT_PORT, a).unwrap();
        let cycle = graph.pass_through_cycle().unwrap();
        assert_eq!(cycle.len(), 2);
        assert!(matches!(graph.validate(), Err(GraphError::PassThroughCycle(_))));
    }

    #[test]
    fn test_condition_breaks_cycle() {
        // listen -> a -> listen settles: re-entering a condition node does not fire
        let mut graph = Graph::new("test");
        let listen = graph.add_node(listener("listen"));
        let a = graph.add_node(action("a"));
        graph.connect_named(listen, "conditions 0", a).unwrap();
        graph.connect_named(a, EXIT_PORT, listen).unwrap();

        assert!(graph.pass_through_cycle().is_none());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_dangling_connection_detected() {
        let mut graph = Graph::new("test");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let listen = graph.add_node(listener("listen"));
        graph.connect_named(start, EXIT_PORT, listen).unwrap();
        graph.forget_node(listen);

        assert!(matches!(graph.validate(), Err(GraphError::DanglingConnection(_))));
    }

    #[test]
    fn test_stop_and_snapshot() {
        let mut graph = Graph::new("test");
        let listen = graph.add_node(listener("listen"));
        graph.node_mut(listen).unwrap().enter();
        assert!(graph.snapshot()[0].active);

        graph.stop();
        let snapshot = graph.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "listen");
        assert_eq!(snapshot[0].kind, "StringCondition");
        assert!(!snapshot[0].active);
        assert_eq!(snapshot[0].last_states, vec![false]);
    }

    #[test]
    fn test_node_ids_and_lookup() {
        let mut graph = Graph::new("test");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let listen = graph.add_node(listener("listen"));

        assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![start, listen]);
        assert_eq!(graph.find_node("listen").map(|n| n.id), Some(listen));
        assert!(graph.find_node("missing").is_none());
    }

    #[test]
    fn test_connections_to_and_disconnect() {
        let mut graph = Graph::new("test");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let a = graph.add_node(action("a"));
        let listen = graph.add_node(listener("listen"));
        let first = graph.connect_named(start, EXIT_PORT, listen).unwrap();
        graph.connect_named(a, EXIT_PORT, listen).unwrap();

        let enter = graph.node(listen).unwrap().input_named(ENTER_PORT).unwrap().id;
        let sources: Vec<_> = graph.connections_to(enter).map(|c| c.from.node).collect();
        assert_eq!(sources, vec![start, a]);

        let removed = graph.disconnect(first).unwrap();
        assert_eq!(removed.from.node, start);
        assert!(graph.disconnect(first).is_none());
        assert_eq!(graph.connections_to(enter).count(), 1);
    }

    #[test]
    fn test_reordered_outputs_rejected_after_load() {
        let mut graph = Graph::new("saved");
        let listen = graph.add_node(StateNode::new(
            "listen",
            NodeKind::StringCondition(ConditionNode::new(
                SignalFilter::any(),
                vec![
                    StringCondition::new(StringCompare::Contains, "a"),
                    StringCondition::new(StringCompare::Contains, "zzz"),
                ],
            )),
        ));
        let x = graph.add_node(action("x"));
        graph.connect_named(listen, "conditions 1", x).unwrap();
        graph.node_mut(listen).unwrap().outputs_mut().swap(0, 1);

        let ron_str = ron::ser::to_string_pretty(&graph, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: Graph = ron::from_str(&ron_str).unwrap();
        assert_eq!(
            loaded.validate(),
            Err(GraphError::PortLayoutMismatch("listen".into()))
        );

        graph.node_mut(listen).unwrap().outputs_mut().clear();
        let ron_str = ron::to_string(&graph).unwrap();
        let loaded: Graph = ron::from_str(&ron_str).unwrap();
        assert!(matches!(loaded.validate(), Err(GraphError::PortLayoutMismatch(_))));
    }

    #[test]
    fn test_reversed_connection_rejected_after_load() {
        let mut graph = Graph::new("saved");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let listen = graph.add_node(listener("listen"));
        let id = graph.connect_named(start, EXIT_PORT, listen).unwrap();

        let connection = graph.connections.get_mut(&id).unwrap();
        std::mem::swap(&mut connection.from, &mut connection.to);

        let ron_str = ron::to_string(&graph).unwrap();
        let loaded: Graph = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded.validate(), Err(GraphError::IncompatiblePorts));
    }

    #[test]
    fn test_serialization() {
        let mut graph = Graph::new("saved");
        let start = graph.add_node(StateNode::new("start", NodeKind::Start));
        let listen = graph.add_node(listener("listen"));
        graph.connect_named(start, EXIT_PORT, listen).unwrap();

        let ron_str = ron::ser::to_string_pretty(&graph, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: Graph = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded.name, "saved");
        assert_eq!(loaded.node_count(), 2);
        assert_eq!(loaded.connection_count(), 1);
        assert!(loaded.validate().is_ok());
    }
}
