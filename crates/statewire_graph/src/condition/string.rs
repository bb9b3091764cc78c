// SPDX-License-Identifier: MIT OR Apache-2.0
//! String comparison conditions.

use super::Condition;
use serde::{Deserialize, Serialize};

/// How a [`StringCondition`] compares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringCompare {
    /// Value starts with the pattern
    #[default]
    StartsWith,
    /// Value ends with the pattern
    EndsWith,
    /// Value contains the pattern
    Contains,
    /// Any comparison this build does not know; never matches
    #[serde(other)]
    Unknown,
}

/// Compares an extracted string against a fixed pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringCondition {
    /// Comparison type
    #[serde(default)]
    pub compare: StringCompare,
    /// Pattern compared against
    #[serde(default)]
    pub value: String,
    /// Invert the comparison result
    #[serde(default)]
    pub inverse: bool,
    #[serde(skip)]
    last_state: bool,
}

impl StringCondition {
    /// Create a non-inverted condition
    pub fn new(compare: StringCompare, value: impl Into<String>) -> Self {
        Self {
            compare,
            value: value.into(),
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

impl Condition for StringCondition {
    type Value = String;

    fn test(&self, value: &String) -> bool {
        match self.compare {
            StringCompare::StartsWith => value.starts_with(self.value.as_str()),
            StringCompare::EndsWith => value.ends_with(self.value.as_str()),
            StringCompare::Contains => value.contains(self.value.as_str()),
            StringCompare::Unknown => false,
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
