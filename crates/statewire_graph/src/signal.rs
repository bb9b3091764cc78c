// SPDX-License-Identifier: MIT OR Apache-2.0
//! Signals delivered into the graph and typed value extraction.
//!
//! A [`Signal`] is an immutable event from an external source, addressed
//! OSC-style (`/str/speech2text/`, `/num/analogin/0/`). Nodes never parse
//! payloads themselves; they ask for a typed value through
//! [`FromSignalValue`] and ignore the signal when none is present.

use serde::{Deserialize, Serialize};

/// Payload carried by a signal or an outbound command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalValue {
    /// Text, e.g. a speech transcription or recognition label
    Text(String),
    /// Single number
    Number(f32),
    /// Several numbers, e.g. one reading per analog channel
    Numbers(Vec<f32>),
    /// Boolean flag
    Flag(bool),
}

impl SignalValue {
    /// Short kind name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Numbers(_) => "numbers",
            Self::Flag(_) => "flag",
        }
    }
}

impl From<&str> for SignalValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SignalValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f32> for SignalValue {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<f32>> for SignalValue {
    fn from(value: Vec<f32>) -> Self {
        Self::Numbers(value)
    }
}

impl From<bool> for SignalValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// An external event delivered into the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Emitting device or service (e.g. `ding1`)
    pub source: String,
    /// Channel address (e.g. `/str/speech2text/`)
    pub address: String,
    /// Payload
    pub payload: SignalValue,
}

impl Signal {
    /// Create a new signal
    pub fn new(
        source: impl Into<String>,
        address: impl Into<String>,
        payload: impl Into<SignalValue>,
    ) -> Self {
        Self {
            source: source.into(),
            address: address.into(),
            payload: payload.into(),
        }
    }

    /// Try to read a typed value out of the payload.
    ///
    /// `component` selects one element of a multi-valued payload.
    pub fn try_extract<T: FromSignalValue>(&self, component: Option<usize>) -> Option<T> {
        T::from_signal_value(&self.payload, component)
    }
}

/// Types that can be extracted from a [`SignalValue`].
///
/// Extraction fails closed: a payload of a different kind yields `None`,
/// never a coerced value.
pub trait FromSignalValue: Sized {
    /// Extract `Self` from `value`, optionally picking one component
    fn from_signal_value(value: &SignalValue, component: Option<usize>) -> Option<Self>;
}

impl FromSignalValue for String {
    fn from_signal_value(value: &SignalValue, _component: Option<usize>) -> Option<Self> {
        match value {
            SignalValue::Text(text) => Some(text.clone()),
            _ => None,
        }
    }
}

impl FromSignalValue for f32 {
    fn from_signal_value(value: &SignalValue, component: Option<usize>) -> Option<Self> {
        match (value, component) {
            (SignalValue::Number(n), None | Some(0)) => Some(*n),
            (SignalValue::Numbers(values), index) => values.get(index.unwrap_or(0)).copied(),
            _ => None,
        }
    }
}

impl FromSignalValue for bool {
    fn from_signal_value(value: &SignalValue, _component: Option<usize>) -> Option<Self> {
        match value {
            SignalValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_extraction() {
        let signal = Signal::new("ding1", "/str/speech2text/", "hello robot");
        assert_eq!(signal.try_extract::<String>(None).as_deref(), Some("hello robot"));
        assert_eq!(signal.try_extract::<f32>(None), None);
        assert_eq!(signal.try_extract::<bool>(None), None);
    }

    #[test]
    fn test_number_components() {
        let signal = Signal::new("ding1", "/num/analogin/0/", vec![0.25_f32, 0.5, 0.75]);
        assert_eq!(signal.try_extract::<f32>(None), Some(0.25));
        assert_eq!(signal.try_extract::<f32>(Some(2)), Some(0.75));
        assert_eq!(signal.try_extract::<f32>(Some(3)), None);

        let single = Signal::new("ding1", "/num/distance/", 4.0_f32);
        assert_eq!(single.try_extract::<f32>(Some(0)), Some(4.0));
        assert_eq!(single.try_extract::<f32>(Some(1)), None);
    }

    #[test]
    fn test_no_coercion() {
        let signal = Signal::new("ding1", "/num/count/", 3.0_f32);
        assert_eq!(signal.try_extract::<String>(None), None);
    }

    #[test]
    fn test_serialization() {
        let signal = Signal::new("ding1", "/str/recognize/", "cup");
        let ron_str = ron::to_string(&signal).unwrap();
        let loaded: Signal = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, signal);
    }
}
