// SPDX-License-Identifier: MIT OR Apache-2.0
//! Numeric threshold conditions, e.g. over analog sensor readings.

use super::Condition;
use serde::{Deserialize, Serialize};

/// How a [`NumberCondition`] compares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberCompare {
    /// Value is strictly above the threshold
    #[default]
    GreaterThan,
    /// Value is strictly below the threshold
    LessThan,
    /// Value equals the threshold within `f32::EPSILON`
    Equals,
    /// Any comparison this build does not know; never matches
    #[serde(other)]
    Unknown,
}

/// Compares an extracted number against a threshold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberCondition {
    /// Comparison type
    #[serde(default)]
    pub compare: NumberCompare,
    /// Threshold compared against
    #[serde(default)]
    pub threshold: f32,
    /// Invert the comparison result
    #[serde(default)]
    pub inverse: bool,
    #[serde(skip)]
    last_state: bool,
}

impl NumberCondition {
    /// Create a non-inverted condition
    pub fn new(compare: NumberCompare, threshold: f32) -> Self {
        Self {
            compare,
            threshold,
            inverse: false,
            last_state: false,
        }
    }

    /// Invert the result
    pub fn inverted(mut self) -> Self {
        self.inverse = true;
        self
    }
}

impl Condition for NumberCondition {
    type Value = f32;

    fn test(&self, value: &f32) -> bool {
        match self.compare {
            NumberCompare::GreaterThan => *value > self.threshold,
            NumberCompare::LessThan => *value < self.threshold,
            NumberCompare::Equals => (*value - self.threshold).abs() <= f32::EPSILON,
            NumberCompare::Unknown => false,
        }
    }

    fn inverse(&self) -> bool {
        self.inverse
    }

    fn last_state(&self) -> bool {
        self.last_state
    }

    fn set_last_state(&mut self, state: bool) {
        self.last_state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let mut above = NumberCondition::new(NumberCompare::GreaterThan, 0.5);
        assert!(above.evaluate(&0.75));
        assert!(!above.evaluate(&0.5));

        let mut below = NumberCondition::new(NumberCompare::LessThan, 0.5);
        assert!(below.evaluate(&0.25));
        assert!(!below.evaluate(&0.5));

        let mut equal = NumberCondition::new(NumberCompare::Equals, 0.5);
        assert!(equal.evaluate(&0.5));
        assert!(!equal.evaluate(&0.51));
    }

    #[test]
    fn test_inverted_threshold() {
        let mut not_above = NumberCondition::new(NumberCompare::GreaterThan, 10.0).inverted();
        assert!(not_above.evaluate(&10.0));
        assert!(!not_above.evaluate(&11.0));
        assert!(!not_above.last_state());
    }

    #[test]
    fn test_unknown_compare_type() {
        let mut condition: NumberCondition =
            ron::from_str("(compare: Between, threshold: 1.0)").unwrap();
        assert_eq!(condition.compare, NumberCompare::Unknown);
        assert!(!condition.evaluate(&1.0));
    }
}
