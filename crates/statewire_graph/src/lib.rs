// SPDX-License-Identifier: MIT OR Apache-2.0
//! Signal-driven state node graph.
//!
//! External signals are filtered and turned into typed values by each
//! active node; condition nodes compare those values and, on a match, enter
//! whatever is wired to the matching output.
//!
//! ## Architecture
//!
//! - [`signal`] / [`filter`]: incoming events and per-node value extraction
//! - [`condition`]: generic condition evaluator plus string/number variants
//! - [`node`] / [`nodes`]: state nodes, lifecycle, pass-through variants
//! - [`graph`] / [`blueprint`]: wiring, validation, name-based construction
//! - [`dispatch`]: signal delivery and activation traversal
//!
//! Everything runs on the caller's thread; there is no I/O.

pub mod blueprint;
pub mod condition;
pub mod connection;
pub mod dispatch;
pub mod filter;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod port;
pub mod signal;

pub use blueprint::{BuildError, GraphBlueprint};
pub use condition::{Condition, ConditionNode, NumberCompare, NumberCondition, StringCompare, StringCondition};
pub use connection::{Connection, ConnectionId, Endpoint};
pub use dispatch::{CyclePolicy, DispatchConfig, DispatchError, DispatchReport, Dispatcher, SignalDelivery, TraversalOrder};
pub use filter::SignalFilter;
pub use graph::{Graph, GraphError};
pub use node::{Lifecycle, NodeId, NodeKind, NodeStatus, StateNode};
pub use nodes::{ActionNode, Command};
pub use port::{Port, PortDirection, PortId};
pub use signal::{FromSignalValue, Signal, SignalValue};
