// SPDX-License-Identifier: MIT OR Apache-2.0
//! Condition evaluation for state nodes.
//!
//! A [`ConditionNode`] holds an ordered list of conditions over a single
//! extracted value. Condition `i` is bound to the output port
//! `"conditions i"`; whenever it evaluates true while the node is active,
//! that port fires.
//!
//! Evaluation never short-circuits: every condition is evaluated on every
//! pass and records its result in `last_state`, active or not. Firing only
//! happens while active, and the node deactivates after the whole pass if
//! anything fired.

mod number;
mod string;

pub use number::{NumberCompare, NumberCondition};
pub use string::{StringCompare, StringCondition};

use crate::filter::SignalFilter;
use crate::node::{NodeBehavior, Outcome};
use crate::port::condition_port_name;
use crate::signal::{FromSignalValue, Signal};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// A single comparison rule with optional inversion and a remembered result
pub trait Condition {
    /// Value type the rule compares against
    type Value: FromSignalValue + Clone + Default + Debug + PartialEq;

    /// Raw comparison, before inversion
    fn test(&self, value: &Self::Value) -> bool;

    /// Whether the raw result is inverted
    fn inverse(&self) -> bool;

    /// Outcome of the most recent evaluation
    fn last_state(&self) -> bool;

    /// Record the outcome of an evaluation
    fn set_last_state(&mut self, state: bool);

    /// Evaluate against `value`, recording the outcome
    fn evaluate(&mut self, value: &Self::Value) -> bool {
        let result = self.test(value) != self.inverse();
        self.set_last_state(result);
        result
    }
}

/// State node variant evaluating an ordered set of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: Serialize",
    deserialize = "C: Deserialize<'de>"
))]
pub struct ConditionNode<C: Condition> {
    /// Which signals feed this node, and how their value is extracted
    #[serde(default)]
    pub filter: SignalFilter,
    /// Conditions, positionally bound to `"conditions i"` outputs
    #[serde(default = "Vec::new")]
    conditions: Vec<C>,
    #[serde(skip)]
    value: C::Value,
    #[serde(skip)]
    signal: Option<Arc<Signal>>,
}

impl<C: Condition> ConditionNode<C> {
    /// Create a condition node
    pub fn new(filter: SignalFilter, conditions: Vec<C>) -> Self {
        Self {
            filter,
            conditions,
            value: C::Value::default(),
            signal: None,
        }
    }

    /// Conditions in evaluation order
    pub fn conditions(&self) -> &[C] {
        &self.conditions
    }

    /// Edit a condition in place. The list itself cannot be reordered.
    pub fn condition_mut(&mut self, index: usize) -> Option<&mut C> {
        self.conditions.get_mut(index)
    }

    /// Current value
    pub fn value(&self) -> &C::Value {
        &self.value
    }

    /// Most recent signal that produced a value
    pub fn current_signal(&self) -> Option<&Arc<Signal>> {
        self.signal.as_ref()
    }

    /// Replace the current value. Does not evaluate.
    pub fn set_value(&mut self, value: C::Value) {
        self.value = value;
    }

    /// Evaluate every condition against the current value.
    ///
    /// Returns the indices of conditions that fired, in order. A condition
    /// fires when it evaluates true and `active` is set.
    pub fn check_conditions(&mut self, active: bool) -> Vec<usize> {
        let mut fired = Vec::new();
        for (index, condition) in self.conditions.iter_mut().enumerate() {
            // Evaluate first so last_state tracks the value even when inactive
            if condition.evaluate(&self.value) && active {
                fired.push(index);
            }
        }
        fired
    }

    /// Extract a value from `signal` and, if found, store it and evaluate.
    ///
    /// Returns `None` when the signal is ignored; node state is untouched.
    pub fn handle_signal(&mut self, signal: &Arc<Signal>, active: bool) -> Option<Vec<usize>> {
        let value = self.filter.extract::<C::Value>(signal)?;
        self.signal = Some(Arc::clone(signal));
        self.set_value(value);
        Some(self.check_conditions(active))
    }

    /// `last_state` of every condition, in order
    pub fn last_states(&self) -> Vec<bool> {
        self.conditions.iter().map(Condition::last_state).collect()
    }
}

impl<C: Condition> Default for ConditionNode<C> {
    fn default() -> Self {
        Self::new(SignalFilter::default(), Vec::new())
    }
}

impl<C: Condition> NodeBehavior for ConditionNode<C> {
    fn output_names(&self) -> Vec<String> {
        (0..self.conditions.len()).map(condition_port_name).collect()
    }

    fn on_signal(&mut self, signal: &Arc<Signal>, active: bool) -> Outcome {
        match self.handle_signal(signal, active) {
            Some(fired) => Outcome::firing(fired),
            None => Outcome::default(),
        }
    }

    fn on_evaluate(&mut self, active: bool) -> Outcome {
        Outcome::firing(self.check_conditions(active))
    }

    fn last_states(&self) -> Vec<bool> {
        ConditionNode::last_states(self)
    }
}
