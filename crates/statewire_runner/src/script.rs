// SPDX-License-Identifier: MIT OR Apache-2.0
//! Signal scripts replayed against a graph.

use crate::error::{parse_ron, read_file, RunnerError};
use serde::{Deserialize, Serialize};
use statewire_graph::Signal;
use std::path::Path;

/// One scripted interaction with the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Deliver a signal
    Signal(Signal),
    /// Enter the named node
    Enter(String),
    /// Exit the named node
    Exit(String),
    /// Re-evaluate the named node against its current value
    Evaluate(String),
    /// Enter every Start node
    Start,
    /// Exit every node
    Stop,
}

/// Ordered list of steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScript {
    /// Steps, replayed in order
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl SignalScript {
    /// Load a script from a RON file
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let content = read_file(path)?;
        let script: SignalScript = parse_ron(path, &content)?;
        tracing::debug!("Loaded {} script steps from {:?}", script.steps.len(), path);
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statewire_graph::SignalValue;

    #[test]
    fn test_parse_steps() {
        let script: SignalScript = ron::from_str(
            r#"(steps: [
                Start,
                Signal((source: "ding1", address: "/str/speech2text/", payload: Text("hello"))),
                Enter("listen"),
                Evaluate("listen"),
                Exit("listen"),
                Stop,
            ])"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 6);
        assert_eq!(script.steps[0], ScriptStep::Start);
        match &script.steps[1] {
            ScriptStep::Signal(signal) => {
                assert_eq!(signal.address, "/str/speech2text/");
                assert_eq!(signal.payload, SignalValue::Text("hello".into()));
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(script.steps[2], ScriptStep::Enter("listen".into()));
    }

    #[test]
    fn test_missing_file() {
        let err = SignalScript::load(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));
    }
}
