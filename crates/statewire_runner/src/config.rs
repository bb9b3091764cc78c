// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runner configuration.
//!
//! Loaded from a RON file; every field is optional:
//!
//! ```ron
//! (
//!     version: 1,
//!     dispatch: (cycles: Allow, order: DepthFirst),
//!     log_filter: "statewire_graph=trace,statewire_runner=info",
//!     start_on_load: true,
//!     print_snapshot: true,
//! )
//! ```

use crate::error::{parse_ron, read_file, RunnerError};
use serde::{Deserialize, Serialize};
use statewire_graph::DispatchConfig;
use std::path::Path;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Log directives used when neither `RUST_LOG` nor the config sets any
pub const DEFAULT_LOG_FILTER: &str = "statewire_graph=debug,statewire_runner=info";

/// Runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Format version
    pub version: u32,
    /// Traversal settings handed to the dispatcher
    pub dispatch: DispatchConfig,
    /// `tracing` filter directives
    pub log_filter: String,
    /// Enter every Start node before replaying the script
    pub start_on_load: bool,
    /// Print the graph snapshot when the script finishes
    pub print_snapshot: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            dispatch: DispatchConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            start_on_load: true,
            print_snapshot: true,
        }
    }
}

impl RunnerConfig {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let content = read_file(path)?;
        let config: RunnerConfig = parse_ron(path, &content)?;
        config.check_version()?;
        tracing::debug!("Loaded runner config from {:?}", path);
        Ok(config)
    }

    fn check_version(&self) -> Result<(), RunnerError> {
        if self.version > CONFIG_FORMAT_VERSION {
            return Err(RunnerError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(())
    }
}
