// SPDX-License-Identifier: MIT OR Apache-2.0
//! A graph plus the dispatcher driving it through a script.

use crate::error::RunnerError;
use crate::script::{ScriptStep, SignalScript};
use serde::{Deserialize, Serialize};
use statewire_graph::{Command, DispatchReport, Dispatcher, Graph, NodeId, NodeStatus};

/// Replay state for one graph
pub struct Session {
    graph: Graph,
    dispatcher: Dispatcher,
    report: DispatchReport,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Graph name
    pub graph: String,
    /// Steps replayed
    pub steps: usize,
    /// Commands emitted, in order
    pub commands: Vec<Command>,
    /// Final node states
    pub nodes: Vec<NodeStatus>,
}

impl Session {
    /// Wrap a built graph; nothing is entered yet
    pub fn new(graph: Graph, dispatcher: Dispatcher) -> Self {
        Self {
            graph,
            dispatcher,
            report: DispatchReport::default(),
        }
    }

    /// Graph being driven
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Everything dispatched so far
    pub fn report(&self) -> &DispatchReport {
        &self.report
    }

    /// Enter every Start node
    pub fn start(&mut self) -> Result<(), RunnerError> {
        let report = self.dispatcher.start(&mut self.graph)?;
        self.record("start", report);
        Ok(())
    }

    /// Replay a whole script
    pub fn run(&mut self, script: &SignalScript) -> Result<usize, RunnerError> {
        for (index, step) in script.steps.iter().enumerate() {
            tracing::debug!(step = index, "{:?}", step);
            self.run_step(step)?;
        }
        Ok(script.steps.len())
    }

    /// Apply one step
    pub fn run_step(&mut self, step: &ScriptStep) -> Result<(), RunnerError> {
        match step {
            ScriptStep::Signal(signal) => {
                let label = signal.address.clone();
                let report = self.dispatcher.dispatch(&mut self.graph, signal.clone())?;
                self.record(&label, report);
            }
            ScriptStep::Enter(name) => {
                let id = self.resolve(name)?;
                let report = self.dispatcher.enter(&mut self.graph, id)?;
                self.record(name, report);
            }
            ScriptStep::Exit(name) => {
                let id = self.resolve(name)?;
                self.dispatcher.exit(&mut self.graph, id)?;
                tracing::info!(node = %name, "Exited");
            }
            ScriptStep::Evaluate(name) => {
                let id = self.resolve(name)?;
                let report = self.dispatcher.evaluate(&mut self.graph, id)?;
                self.record(name, report);
            }
            ScriptStep::Start => self.start()?,
            ScriptStep::Stop => {
                self.graph.stop();
                tracing::info!(graph = %self.graph.name, "Stopped");
            }
        }
        Ok(())
    }

    /// Final state after `steps` script steps
    pub fn summary(&self, steps: usize) -> RunSummary {
        RunSummary {
            graph: self.graph.name.clone(),
            steps,
            commands: self.report.commands.clone(),
            nodes: self.graph.snapshot(),
        }
    }

    fn resolve(&self, name: &str) -> Result<NodeId, RunnerError> {
        self.graph
            .find_node(name)
            .map(|n| n.id)
            .ok_or_else(|| RunnerError::UnknownNode(name.to_string()))
    }

    fn record(&mut self, label: &str, report: DispatchReport) {
        for command in &report.commands {
            tracing::info!(address = %command.address, args = ?command.args, "Command");
        }
        if report.is_quiet() {
            tracing::debug!(step = %label, recipients = report.recipients, "No transitions");
        } else {
            let entered: Vec<&str> = report
                .entered
                .iter()
                .filter_map(|id| self.graph.node(*id))
                .map(|n| n.name.as_str())
                .collect();
            tracing::info!(step = %label, ?entered, fired = report.fired.len(), "Transitions");
        }
        if !report.truncated.is_empty() {
            tracing::warn!(step = %label, count = report.truncated.len(), "Re-entries truncated");
        }
        if report.dangling > 0 {
            tracing::warn!(step = %label, count = report.dangling, "Skipped dangling connections");
        }
        self.report.merge(report);
    }
}

impl RunSummary {
    /// Pretty RON
    pub fn to_ron(&self) -> Result<String, RunnerError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Pretty JSON
    pub fn to_json(&self) -> Result<String, RunnerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
