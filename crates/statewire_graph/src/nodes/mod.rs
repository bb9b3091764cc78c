// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pass-through node variants.
//!
//! These nodes fire their `exit` port as soon as they are entered and drop
//! back to inactive. Condition variants live in [`crate::condition`].

pub mod action;
pub mod start;

pub use action::{ActionNode, Command};
pub use start::StartNode;
