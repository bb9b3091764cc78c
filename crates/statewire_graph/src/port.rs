// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for state node inputs/outputs.
//!
//! Every port on a state node carries activation flow only. Output ports are
//! addressed by name (`exit`, `conditions 0`, ...) and fan out to any number
//! of downstream `enter` ports.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the single input port every enterable node exposes
pub const ENTER_PORT: &str = "enter";

/// Name of the output port fired by pass-through nodes
pub const EXIT_PORT: &str = "exit";

/// Name of the output port bound to the condition at `index`.
///
/// The binding is positional: condition `i` always fires `"conditions i"`.
pub fn condition_port_name(index: usize) -> String {
    format!("conditions {index}")
}

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Receives activation (`Enter`)
    Input,
    /// Fires activation to connected inputs
    Output,
}

/// A named attachment point on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name, unique per node and direction
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
}

impl Port {
    /// Create a new input port
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Input,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Output,
        }
    }

    /// Whether this port is an output
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Check if a connection from this port to `other` is valid.
    ///
    /// Activation always flows output -> input.
    pub fn can_connect(&self, other: &Port) -> bool {
        self.is_output() && !other.is_output()
    }
}
