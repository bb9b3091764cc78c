// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph entry point.

use crate::node::{NodeBehavior, Outcome};
use crate::port::EXIT_PORT;

/// Entry node: no input, one `exit` output fired on entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartNode;

impl NodeBehavior for StartNode {
    fn accepts_entry(&self) -> bool {
        false
    }

    fn fires_on_enter(&self) -> bool {
        true
    }

    fn output_names(&self) -> Vec<String> {
        vec![EXIT_PORT.to_string()]
    }

    fn on_enter(&mut self) -> Outcome {
        Outcome::firing(vec![0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_fires_exit() {
        let mut start = StartNode;
        let outcome = start.on_enter();
        assert_eq!(outcome.fired, vec![0]);
        assert!(outcome.deactivate);
        assert!(outcome.commands.is_empty());
        assert!(!start.accepts_entry());
    }
}
