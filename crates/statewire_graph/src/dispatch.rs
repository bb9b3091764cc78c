// SPDX-License-Identifier: MIT OR Apache-2.0
//! Signal dispatch and activation traversal.
//!
//! Dispatch is synchronous and single-threaded. A signal is delivered to
//! each recipient in graph order; when a recipient fires, every connected
//! downstream node is entered through an explicit frontier before the next
//! recipient sees the signal. Entering a pass-through node fires it in turn,
//! so the frontier keeps growing until the cascade settles.
//!
//! Each pending entry remembers the chain of nodes that caused it. Reaching
//! a node already on its own chain is an activation cycle, handled per
//! [`CyclePolicy`]. `max_steps` bounds the total number of entries per call
//! regardless of policy.
//!
//! A firing node has already deactivated when its downstream nodes are
//! entered. Under [`CyclePolicy::Allow`], a cascade that leads back to the
//! source therefore leaves it active, unlike a recursive evaluator that
//! deactivates after its downstream calls return.

use crate::graph::Graph;
use crate::node::{Lifecycle, NodeId, NodeKind, Transition};
use crate::nodes::Command;
use crate::port::PortId;
use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default bound on node entries per dispatch
pub const DEFAULT_MAX_STEPS: usize = 1024;

/// Order in which a cascade is expanded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalOrder {
    /// All nodes entered by one firing before anything they fire
    #[default]
    BreadthFirst,
    /// Each entered node's own cascade completes before its next sibling
    DepthFirst,
}

/// What to do when a cascade re-enters a node on its own causal chain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePolicy {
    /// Abort the dispatch with [`DispatchError::ActivationCycle`]
    #[default]
    Reject,
    /// Skip the re-entry and keep going
    Truncate,
    /// Re-enter; only `max_steps` bounds the cascade
    Allow,
}

/// Which nodes receive signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDelivery {
    /// Only nodes active when delivery reaches them
    #[default]
    ActiveOnly,
    /// Every node; inactive ones update condition state without firing
    All,
}

/// Dispatch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Cascade expansion order
    pub order: TraversalOrder,
    /// Activation cycle handling
    pub cycles: CyclePolicy,
    /// Signal recipients
    pub delivery: SignalDelivery,
    /// Upper bound on node entries per call
    pub max_steps: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            order: TraversalOrder::default(),
            cycles: CyclePolicy::default(),
            delivery: SignalDelivery::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// An output port that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    /// Firing node
    pub node: NodeId,
    /// Fired output port
    pub port: PortId,
}

/// Everything that happened during one dispatcher call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Nodes the signal was delivered to
    pub recipients: usize,
    /// Entered nodes, in entry order
    pub entered: Vec<NodeId>,
    /// Fired ports, in firing order
    pub fired: Vec<Firing>,
    /// Outbound commands, in emission order
    pub commands: Vec<Command>,
    /// Re-entries skipped under [`CyclePolicy::Truncate`]
    pub truncated: Vec<NodeId>,
    /// Connections skipped because their target is gone
    pub dangling: usize,
}

impl DispatchReport {
    /// Whether nothing fired and nothing was entered
    pub fn is_quiet(&self) -> bool {
        self.entered.is_empty() && self.fired.is_empty()
    }

    /// Append another report
    pub fn merge(&mut self, other: DispatchReport) {
        self.recipients += other.recipients;
        self.entered.extend(other.entered);
        self.fired.extend(other.fired);
        self.commands.extend(other.commands);
        self.truncated.extend(other.truncated);
        self.dangling += other.dangling;
    }
}

/// Fault during traversal.
///
/// Node state changed before the fault is kept.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// Cascade re-entered a node on its own causal chain
    #[error("Activation cycle: node {node} re-entered from its own cascade")]
    ActivationCycle {
        /// Re-entered node
        node: NodeId,
        /// Causal chain that led back to it
        path: Vec<NodeId>,
    },

    /// Cascade exceeded the configured entry bound
    #[error("Dispatch exceeded {0} node entries")]
    StepLimitExceeded(usize),

    /// Node addressed directly does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

struct Pending {
    target: NodeId,
    path: Vec<NodeId>,
}

/// Drives signals and lifecycle calls through a [`Graph`]
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Active settings
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Deliver a signal and run every cascade it triggers.
    ///
    /// Recipients are chosen when delivery starts; nodes entered during
    /// this dispatch wait for the next signal.
    pub fn dispatch(&self, graph: &mut Graph, signal: Signal) -> Result<DispatchReport, DispatchError> {
        let signal = Arc::new(signal);
        let deliver_all = self.config.delivery == SignalDelivery::All;
        let recipients: Vec<NodeId> = graph.nodes()
            .filter(|n| deliver_all || n.is_active())
            .map(|n| n.id)
            .collect();

        tracing::debug!(
            address = %signal.address,
            source = %signal.source,
            recipients = recipients.len(),
            "Dispatching signal"
        );

        let mut report = DispatchReport::default();
        let mut steps = 0;
        for id in recipients {
            let Some(node) = graph.node_mut(id) else {
                continue;
            };
            // An earlier cascade may have deactivated it
            if !deliver_all && !node.is_active() {
                continue;
            }
            report.recipients += 1;
            let transition = node.handle_signal(&signal);
            self.cascade(graph, id, transition, &mut report, &mut steps)?;
        }
        Ok(report)
    }

    /// Enter every Start node, in graph order
    pub fn start(&self, graph: &mut Graph) -> Result<DispatchReport, DispatchError> {
        let starts: Vec<NodeId> = graph.nodes()
            .filter(|n| matches!(n.kind(), NodeKind::Start))
            .map(|n| n.id)
            .collect();
        tracing::debug!(graph = %graph.name, starts = starts.len(), "Starting graph");

        let mut report = DispatchReport::default();
        let mut steps = 0;
        let frontier = starts.into_iter()
            .map(|target| Pending { target, path: Vec::new() })
            .collect();
        self.drain(graph, frontier, &mut report, &mut steps)?;
        Ok(report)
    }

    /// Enter one node from outside the graph and run its cascade
    pub fn enter(&self, graph: &mut Graph, node: NodeId) -> Result<DispatchReport, DispatchError> {
        if graph.node(node).is_none() {
            return Err(DispatchError::NodeNotFound(node));
        }
        let mut report = DispatchReport::default();
        let mut steps = 0;
        let frontier = VecDeque::from([Pending { target: node, path: Vec::new() }]);
        self.drain(graph, frontier, &mut report, &mut steps)?;
        Ok(report)
    }

    /// Exit one node from outside the graph
    pub fn exit(&self, graph: &mut Graph, node: NodeId) -> Result<(), DispatchError> {
        graph.node_mut(node)
            .ok_or(DispatchError::NodeNotFound(node))?
            .exit();
        Ok(())
    }

    /// Re-evaluate one node against its current value and run the cascade
    pub fn evaluate(&self, graph: &mut Graph, node: NodeId) -> Result<DispatchReport, DispatchError> {
        let transition = graph.node_mut(node)
            .ok_or(DispatchError::NodeNotFound(node))?
            .evaluate();
        let mut report = DispatchReport::default();
        let mut steps = 0;
        self.cascade(graph, node, transition, &mut report, &mut steps)?;
        Ok(report)
    }

    fn cascade(
        &self,
        graph: &mut Graph,
        source: NodeId,
        transition: Transition,
        report: &mut DispatchReport,
        steps: &mut usize,
    ) -> Result<(), DispatchError> {
        if transition.is_empty() {
            return Ok(());
        }
        let mut frontier = VecDeque::new();
        self.expand(graph, source, transition, &[], &mut frontier, report);
        self.drain(graph, frontier, report, steps)
    }

    fn drain(
        &self,
        graph: &mut Graph,
        mut frontier: VecDeque<Pending>,
        report: &mut DispatchReport,
        steps: &mut usize,
    ) -> Result<(), DispatchError> {
        while let Some(pending) = frontier.pop_front() {
            if pending.path.contains(&pending.target) {
                match self.config.cycles {
                    CyclePolicy::Reject => {
                        return Err(DispatchError::ActivationCycle {
                            node: pending.target,
                            path: pending.path,
                        });
                    }
                    CyclePolicy::Truncate => {
                        tracing::warn!(node = %pending.target, "Skipping activation cycle");
                        report.truncated.push(pending.target);
                        continue;
                    }
                    CyclePolicy::Allow => {}
                }
            }

            let Some(node) = graph.node_mut(pending.target) else {
                tracing::debug!(node = %pending.target, "Skipping connection to missing node");
                report.dangling += 1;
                continue;
            };

            *steps += 1;
            if *steps > self.config.max_steps {
                return Err(DispatchError::StepLimitExceeded(self.config.max_steps));
            }

            let transition = node.enter();
            report.entered.push(pending.target);
            self.expand(graph, pending.target, transition, &pending.path, &mut frontier, report);
        }
        Ok(())
    }

    fn expand(
        &self,
        graph: &Graph,
        source: NodeId,
        transition: Transition,
        path: &[NodeId],
        frontier: &mut VecDeque<Pending>,
        report: &mut DispatchReport,
    ) {
        report.commands.extend(transition.commands);

        let mut chain = path.to_vec();
        chain.push(source);

        let mut next = Vec::new();
        for port in transition.fired {
            report.fired.push(Firing { node: source, port });
            next.extend(graph.connections_from(port).map(|c| Pending {
                target: c.to.node,
                path: chain.clone(),
            }));
        }

        match self.config.order {
            TraversalOrder::BreadthFirst => frontier.extend(next),
            TraversalOrder::DepthFirst => {
                for pending in next.into_iter().rev() {
                    frontier.push_front(pending);
                }
            }
        }
    }
}
