// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node signal filter.

use crate::signal::{FromSignalValue, Signal};
use serde::{Deserialize, Serialize};

/// Decides whether a signal is relevant to a node and extracts its value.
///
/// Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalFilter {
    /// Required signal source
    pub source: Option<String>,
    /// Required channel address
    pub address: Option<String>,
    /// Component to pick from multi-valued payloads
    pub component: Option<usize>,
}

impl SignalFilter {
    /// A filter that accepts every signal
    pub fn any() -> Self {
        Self::default()
    }

    /// A filter for one channel address
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    /// Restrict to a source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Pick one component of a multi-valued payload
    pub fn with_component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }

    /// Check whether a signal is relevant
    pub fn matches(&self, signal: &Signal) -> bool {
        let source_ok = self.source.as_deref().map_or(true, |s| s == signal.source);
        let address_ok = self.address.as_deref().map_or(true, |a| a == signal.address);
        source_ok && address_ok
    }

    /// Extract a typed value from a relevant signal.
    ///
    /// Returns `None` if the signal does not match or carries no value of
    /// type `T`.
    pub fn extract<T: FromSignalValue>(&self, signal: &Signal) -> Option<T> {
        if !self.matches(signal) {
            return None;
        }
        let value = signal.try_extract(self.component);
        if value.is_none() {
            tracing::trace!(
                address = %signal.address,
                payload = signal.payload.kind(),
                "Signal matched filter but carried no extractable value"
            );
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_filter() {
        let filter = SignalFilter::any();
        let signal = Signal::new("ding2", "/str/recognize/", "person");
        assert!(filter.matches(&signal));
        assert_eq!(filter.extract::<String>(&signal).as_deref(), Some("person"));
    }

    #[test]
    fn test_address_and_source() {
        let filter = SignalFilter::address("/str/speech2text/").with_source("ding1");

        assert!(filter.matches(&Signal::new("ding1", "/str/speech2text/", "hi")));
        assert!(!filter.matches(&Signal::new("ding2", "/str/speech2text/", "hi")));
        assert!(!filter.matches(&Signal::new("ding1", "/str/recognize/", "hi")));
        assert_eq!(
            filter.extract::<String>(&Signal::new("ding1", "/str/recognize/", "hi")),
            None
        );
    }

    #[test]
    fn test_component_selection() {
        let filter = SignalFilter::address("/num/analogin/0/").with_component(1);
        let signal = Signal::new("ding1", "/num/analogin/0/", vec![1.0_f32, 2.0, 3.0]);
        assert_eq!(filter.extract::<f32>(&signal), Some(2.0));
    }

    #[test]
    fn test_extraction_miss() {
        let filter = SignalFilter::any();
        let signal = Signal::new("ding1", "/num/analogin/0/", vec![1.0_f32]);
        assert_eq!(filter.extract::<String>(&signal), None);
    }

    #[test]
    fn test_ron_defaults() {
        let filter: SignalFilter = ron::from_str("(address: Some(\"/str/recognize/\"))").unwrap();
        assert_eq!(filter, SignalFilter::address("/str/recognize/"));
    }
}
