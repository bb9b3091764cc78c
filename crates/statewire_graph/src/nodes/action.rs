// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action nodes emit an outbound command for the host, then pass through.
//!
//! Commands mirror what a device understands: an address plus positional
//! arguments (`/speak/ "hello"`, `/move/ "forward" 2.0 0.5 "easeIn"`).
//! The graph never executes them; they are collected in the dispatch
//! report for the host to forward.

use crate::node::{NodeBehavior, Outcome};
use crate::port::EXIT_PORT;
use crate::signal::SignalValue;
use serde::{Deserialize, Serialize};

/// Outbound message produced by an [`ActionNode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Target address
    pub address: String,
    /// Positional arguments
    #[serde(default)]
    pub args: Vec<SignalValue>,
}

impl Command {
    /// Create a command without arguments
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, value: impl Into<SignalValue>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Emits its command on entry and fires `exit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionNode {
    /// Command sent every time the node is entered
    pub command: Command,
}

impl ActionNode {
    /// Create an action node
    pub fn new(command: Command) -> Self {
        Self { command }
    }
}

impl NodeBehavior for ActionNode {
    fn fires_on_enter(&self) -> bool {
        true
    }

    fn output_names(&self) -> Vec<String> {
        vec![EXIT_PORT.to_string()]
    }

    fn on_enter(&mut self) -> Outcome {
        let mut outcome = Outcome::firing(vec![0]);
        outcome.commands.push(self.command.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_emits_command() {
        let mut node = ActionNode::new(Command::new("/speak/").arg("hello"));
        let outcome = node.on_enter();

        assert_eq!(outcome.fired, vec![0]);
        assert!(outcome.deactivate);
        assert_eq!(outcome.commands.len(), 1);
        assert_eq!(outcome.commands[0].address, "/speak/");
        assert_eq!(outcome.commands[0].args, vec![SignalValue::Text("hello".into())]);
    }

    #[test]
    fn test_transparent_format() {
        let node: ActionNode =
            ron::from_str("(address: \"/move/\", args: [Text(\"forward\"), Number(2.0)])").unwrap();
        assert_eq!(
            node.command,
            Command::new("/move/").arg("forward").arg(2.0_f32)
        );
    }
}
