// SPDX-License-Identifier: MIT OR Apache-2.0
//! Name-based graph description and validated construction.
//!
//! A blueprint refers to nodes by name and to outputs by port name, so it
//! can be written by hand:
//!
//! ```ron
//! (
//!     name: "greeter",
//!     nodes: [
//!         (name: "start", kind: Start),
//!         (name: "listen", kind: StringCondition((
//!             filter: (address: Some("/str/speech2text/")),
//!             conditions: [(compare: Contains, value: "hello")],
//!         ))),
//!         (name: "greet", kind: Action((address: "/speak/", args: [Text("hi")]))),
//!     ],
//!     connections: [
//!         (from: "start", port: "exit", to: "listen"),
//!         (from: "listen", port: "conditions 0", to: "greet"),
//!     ],
//! )
//! ```
//!
//! Every connection targets the `enter` input of its `to` node. Wiring
//! problems are reported by [`GraphBlueprint::build`], never at dispatch.

use crate::graph::{Graph, GraphError};
use crate::node::{NodeId, NodeKind, StateNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One node in a blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBlueprint {
    /// Unique node name
    pub name: String,
    /// Node variant and its settings
    pub kind: NodeKind,
}

/// One connection in a blueprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionBlueprint {
    /// Firing node name
    pub from: String,
    /// Output port name on `from`
    pub port: String,
    /// Entered node name
    pub to: String,
}

/// Serializable graph description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphBlueprint {
    /// Graph name
    pub name: String,
    /// Nodes, in delivery order
    #[serde(default)]
    pub nodes: Vec<NodeBlueprint>,
    /// Connections, in firing order per port
    #[serde(default)]
    pub connections: Vec<ConnectionBlueprint>,
}

impl GraphBlueprint {
    /// Parse a blueprint from RON
    pub fn from_ron(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Build a validated graph
    pub fn build(&self) -> Result<Graph, BuildError> {
        let mut graph = Graph::new(self.name.clone());
        let mut ids: HashMap<&str, NodeId> = HashMap::new();

        for node in &self.nodes {
            if ids.contains_key(node.name.as_str()) {
                return Err(BuildError::DuplicateNode(node.name.clone()));
            }
            let id = graph.add_node(StateNode::new(node.name.clone(), node.kind.clone()));
            ids.insert(node.name.as_str(), id);
        }

        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| BuildError::UnknownNode(name.to_string()))
        };
        for connection in &self.connections {
            let from = lookup(&connection.from)?;
            let to = lookup(&connection.to)?;
            graph.connect_named(from, &connection.port, to)?;
        }

        graph.validate()?;
        tracing::debug!(
            graph = %graph.name,
            nodes = graph.node_count(),
            connections = graph.connection_count(),
            "Built graph"
        );
        Ok(graph)
    }
}

/// Blueprint that cannot be turned into a graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// Two nodes share a name
    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    /// Connection names a node that is not declared
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Wiring rejected by the graph
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Lifecycle;

    const GREETER: &str = r#"(
        name: "greeter",
        nodes: [
            (name: "start", kind: Start),
            (name: "listen", kind: StringCondition((
                filter: (address: Some("/str/speech2text/")),
                conditions: [
                    (compare: Contains, value: "hello"),
                    (compare: StartsWith, value: "bye", inverse: true),
                ],
            ))),
            (name: "greet", kind: Action((address: "/speak/", args: [Text("hi")]))),
            (name: "level", kind: NumberCondition((
                filter: (address: Some("/num/analogin/0/"), component: Some(1)),
                conditions: [(compare: GreaterThan, threshold: 0.5)],
            ))),
        ],
        connections: [
            (from: "start", port: "exit", to: "listen"),
            (from: "listen", port: "conditions 0", to: "greet"),
            (from: "greet", port: "exit", to: "level"),
        ],
    )"#;

    #[test]
    fn test_build_from_ron() {
        let blueprint = GraphBlueprint::from_ron(GREETER).unwrap();
        let graph = blueprint.build().unwrap();

        assert_eq!(graph.name, "greeter");
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.connection_count(), 3);

        let listen = graph.find_node("listen").unwrap();
        assert_eq!(listen.outputs().len(), 2);
        assert!(!listen.is_active());
        assert!(graph.nodes().all(|n| !n.is_active()));
    }

    #[test]
    fn test_round_trip() {
        let blueprint = GraphBlueprint::from_ron(GREETER).unwrap();
        let ron_str = blueprint.to_ron().unwrap();
        assert_eq!(GraphBlueprint::from_ron(&ron_str).unwrap(), blueprint);
    }

    #[test]
    fn test_duplicate_node() {
        let blueprint = GraphBlueprint::from_ron(
            r#"(name: "dup", nodes: [(name: "a", kind: Start), (name: "a", kind: Start)])"#,
        )
        .unwrap();
        assert_eq!(blueprint.build().unwrap_err(), BuildError::DuplicateNode("a".into()));
    }

    #[test]
    fn test_unknown_node() {
        let blueprint = GraphBlueprint::from_ron(
            r#"(
                name: "missing",
                nodes: [(name: "start", kind: Start)],
                connections: [(from: "start", port: "exit", to: "nowhere")],
            )"#,
        )
        .unwrap();
        assert_eq!(blueprint.build().unwrap_err(), BuildError::UnknownNode("nowhere".into()));
    }

    #[test]
    fn test_unknown_port() {
        let blueprint = GraphBlueprint::from_ron(
            r#"(
                name: "port",
                nodes: [
                    (name: "start", kind: Start),
                    (name: "listen", kind: StringCondition((conditions: []))),
                ],
                connections: [(from: "start", port: "conditions 0", to: "listen")],
            )"#,
        )
        .unwrap();
        assert!(matches!(
            blueprint.build(),
            Err(BuildError::Graph(GraphError::PortNameNotFound { .. }))
        ));
    }

    #[test]
    fn test_pass_through_cycle_rejected() {
        let blueprint = GraphBlueprint::from_ron(
            r#"(
                name: "spin",
                nodes: [
                    (name: "a", kind: Action((address: "/a/"))),
                    (name: "b", kind: Action((address: "/b/"))),
                ],
                connections: [
                    (from: "a", port: "exit", to: "b"),
                    (from: "b", port: "exit", to: "a"),
                ],
            )"#,
        )
        .unwrap();
        assert!(matches!(
            blueprint.build(),
            Err(BuildError::Graph(GraphError::PassThroughCycle(_)))
        ));
    }
}
