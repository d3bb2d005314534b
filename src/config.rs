//! Optional TOML defaults for the grapher.
//!
//! ```toml
//! keep-ssid = false
//! include-origins = true
//! records = "/var/lib/ax25/nodes.json"
//! poll-ms = 1000
//! decode = "strip"
//! page-size = 50
//! ```
//!
//! Command-line flags always win over values from the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analyzer::DecodeMode;

/// Default poll interval when following a log file.
pub const DEFAULT_POLL_MS: u64 = 1000;
/// Default number of records per listed page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct GrapherConfig {
    pub keep_ssid: bool,
    pub include_origins: bool,
    /// Path of the node record store.
    pub records: Option<PathBuf>,
    pub poll_ms: Option<u64>,
    pub decode: DecodeMode,
    pub page_size: Option<usize>,
}

impl GrapherConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the config file
    ///
    /// # Returns
    /// * `Ok(GrapherConfig)` if the file was successfully loaded and parsed
    /// * `Err(String)` with a descriptive error message otherwise
    pub fn load(config_path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(config_path).map_err(|e| format!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    pub fn poll_ms(&self) -> u64 {
        self.poll_ms.unwrap_or(DEFAULT_POLL_MS)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}
