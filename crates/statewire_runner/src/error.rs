// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner errors.

use statewire_graph::{BuildError, DispatchError};
use std::path::PathBuf;

/// Anything that stops a run
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// File could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid RON for the expected type
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: ron::error::SpannedError,
    },

    /// Config written by a newer runner
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// Blueprint rejected
    #[error("Invalid graph: {0}")]
    Build(#[from] BuildError),

    /// Traversal fault
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// Script names a node the graph does not have
    #[error("Unknown node in script: {0}")]
    UnknownNode(String),

    /// Summary could not be rendered as RON
    #[error("Failed to render summary: {0}")]
    RenderRon(#[from] ron::Error),

    /// Summary could not be rendered as JSON
    #[error("Failed to render summary: {0}")]
    RenderJson(#[from] serde_json::Error),
}

/// Read a whole file, tagging errors with its path
pub fn read_file(path: &std::path::Path) -> Result<String, RunnerError> {
    std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse RON, tagging errors with the file path
pub fn parse_ron<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
    content: &str,
) -> Result<T, RunnerError> {
    ron::from_str(content).map_err(|source| RunnerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
