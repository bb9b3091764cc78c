// SPDX-License-Identifier: MIT OR Apache-2.0
//! State node definitions.
//!
//! A [`StateNode`] is the graph vertex: an activation flag, named ports and a
//! [`NodeKind`] carrying variant-specific behavior. Variants never touch the
//! graph; they report which of their outputs fired and the dispatcher does
//! the traversal.

use crate::condition::{ConditionNode, NumberCondition, StringCondition};
use crate::nodes::{ActionNode, Command, StartNode};
use crate::port::{Port, PortDirection, PortId, ENTER_PORT};
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a variant did in response to a lifecycle call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Indices into the node's outputs that fired, in firing order
    pub fired: Vec<usize>,
    /// Outbound commands for the host
    pub commands: Vec<Command>,
    /// Drop to inactive once the call completes
    pub deactivate: bool,
}

impl Outcome {
    /// Outcome firing `fired`; deactivates if anything fired
    pub fn firing(fired: Vec<usize>) -> Self {
        Self {
            deactivate: !fired.is_empty(),
            fired,
            commands: Vec::new(),
        }
    }
}

/// Variant-specific behavior behind a [`StateNode`]
pub trait NodeBehavior {
    /// Whether the node has an `enter` input port
    fn accepts_entry(&self) -> bool {
        true
    }

    /// Whether entering the node fires outputs immediately
    fn fires_on_enter(&self) -> bool {
        false
    }

    /// Output port names, in port order
    fn output_names(&self) -> Vec<String>;

    /// Called after the node became active
    fn on_enter(&mut self) -> Outcome {
        Outcome::default()
    }

    /// Called for every delivered signal
    fn on_signal(&mut self, _signal: &Arc<Signal>, _active: bool) -> Outcome {
        Outcome::default()
    }

    /// Re-run evaluation against current state without a new signal
    fn on_evaluate(&mut self, _active: bool) -> Outcome {
        Outcome::default()
    }

    /// Remembered condition results, if any
    fn last_states(&self) -> Vec<bool> {
        Vec::new()
    }
}

/// Closed set of node variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Graph entry point
    Start,
    /// Emits a command and passes through
    Action(ActionNode),
    /// Conditions over an extracted string
    StringCondition(ConditionNode<StringCondition>),
    /// Conditions over an extracted number
    NumberCondition(ConditionNode<NumberCondition>),
}

impl NodeKind {
    /// Variant name for display
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Action(_) => "Action",
            Self::StringCondition(_) => "StringCondition",
            Self::NumberCondition(_) => "NumberCondition",
        }
    }

    /// Shared view of the behavior
    pub fn behavior(&self) -> &dyn NodeBehavior {
        match self {
            Self::Start => &StartNode,
            Self::Action(node) => node,
            Self::StringCondition(node) => node,
            Self::NumberCondition(node) => node,
        }
    }

    fn with_behavior<R>(&mut self, f: impl FnOnce(&mut dyn NodeBehavior) -> R) -> R {
        match self {
            Self::Start => f(&mut StartNode),
            Self::Action(node) => f(node),
            Self::StringCondition(node) => f(node),
            Self::NumberCondition(node) => f(node),
        }
    }
}

/// Activation lifecycle every state node exposes
pub trait Lifecycle {
    /// Activate the node and run its entry behavior
    fn enter(&mut self) -> Transition;

    /// Deactivate the node unconditionally
    fn exit(&mut self);

    /// Whether the node is currently active
    fn is_active(&self) -> bool;
}

/// Ports fired and commands emitted by one node during one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    /// Fired output ports, in firing order
    pub fired: Vec<PortId>,
    /// Outbound commands
    pub commands: Vec<Command>,
}

impl Transition {
    /// Whether nothing fired and nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty() && self.commands.is_empty()
    }
}

/// A state node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateNode {
    /// Unique instance ID
    pub id: NodeId,
    /// Display name, unique within a blueprint
    pub name: String,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    kind: NodeKind,
    #[serde(skip)]
    active: bool,
}

impl StateNode {
    /// Create an inactive node with ports derived from its kind
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let inputs = Self::input_names(&kind).into_iter().map(Port::input).collect();
        let outputs = kind.behavior().output_names().into_iter().map(Port::output).collect();

        Self {
            id: NodeId::new(),
            name: name.into(),
            inputs,
            outputs,
            kind,
            active: false,
        }
    }

    /// Node variant
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Input ports
    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    /// Output ports, positionally matching the variant's output names
    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Whether the ports are exactly the ones the variant expects, in order.
    ///
    /// Always true for nodes built with [`StateNode::new`]; a deserialized
    /// node can disagree with its kind.
    pub fn has_expected_ports(&self) -> bool {
        let same = |ports: &[Port], names: Vec<String>, direction: PortDirection| {
            ports.len() == names.len()
                && ports.iter().zip(&names).all(|(p, n)| p.name == *n && p.direction == direction)
        };
        same(&self.inputs, Self::input_names(&self.kind), PortDirection::Input)
            && same(&self.outputs, self.kind.behavior().output_names(), PortDirection::Output)
    }

    fn input_names(kind: &NodeKind) -> Vec<String> {
        if kind.behavior().accepts_entry() {
            vec![ENTER_PORT.to_string()]
        } else {
            Vec::new()
        }
    }

    #[cfg(test)]
    pub(crate) fn outputs_mut(&mut self) -> &mut Vec<Port> {
        &mut self.outputs
    }

    /// String condition variant, if this is one
    pub fn string_conditions_mut(&mut self) -> Option<&mut ConditionNode<StringCondition>> {
        match &mut self.kind {
            NodeKind::StringCondition(node) => Some(node),
            _ => None,
        }
    }

    /// Number condition variant, if this is one
    pub fn number_conditions_mut(&mut self) -> Option<&mut ConditionNode<NumberCondition>> {
        match &mut self.kind {
            NodeKind::NumberCondition(node) => Some(node),
            _ => None,
        }
    }

    /// Get an input port by name
    pub fn input_named(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output port by name
    pub fn output_named(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get a port by ID
    pub fn port(&self, port_id: &PortId) -> Option<&Port> {
        self.ports().find(|p| p.id == *port_id)
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Deliver a signal.
    ///
    /// Conditions are evaluated whether or not the node is active; outputs
    /// only fire while active.
    pub fn handle_signal(&mut self, signal: &Arc<Signal>) -> Transition {
        let active = self.active;
        let outcome = self.kind.with_behavior(|b| b.on_signal(signal, active));
        self.apply(outcome)
    }

    /// Re-evaluate against the current value without a new signal
    pub fn evaluate(&mut self) -> Transition {
        let active = self.active;
        let outcome = self.kind.with_behavior(|b| b.on_evaluate(active));
        self.apply(outcome)
    }

    /// Observable state for display
    pub fn status(&self) -> NodeStatus {
        NodeStatus {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind.name().to_string(),
            active: self.active,
            last_states: self.kind.behavior().last_states(),
        }
    }

    fn apply(&mut self, outcome: Outcome) -> Transition {
        let mut fired = Vec::with_capacity(outcome.fired.len());
        for index in outcome.fired {
            match self.outputs.get(index) {
                Some(port) => fired.push(port.id),
                None => tracing::warn!(node = %self.name, index, "Fired output has no port"),
            }
        }
        if outcome.deactivate {
            self.active = false;
        }
        Transition {
            fired,
            commands: outcome.commands,
        }
    }
}

impl Lifecycle for StateNode {
    fn enter(&mut self) -> Transition {
        self.active = true;
        tracing::trace!(node = %self.name, "Entered");
        let outcome = self.kind.with_behavior(|b| b.on_enter());
        self.apply(outcome)
    }

    fn exit(&mut self) {
        self.active = false;
        tracing::trace!(node = %self.name, "Exited");
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Read-only view of a node's runtime state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Node ID
    pub id: NodeId,
    /// Node name
    pub name: String,
    /// Variant name
    pub kind: String,
    /// Activation flag
    pub active: bool,
    /// Condition results from the latest evaluation
    pub last_states: Vec<bool>,
}
