//! # Configuration
//!
//! TOML configuration for view defaults and input limits.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI arguments
//! 2. Config file (`--config <path>` or `HEAPSCOPE_CONFIG`)
//! 3. Hardcoded defaults
//!
//! ```toml
//! [view]
//! sort = "size"
//! ascending = false
//! max_depth = 3
//! references = true
//!
//! [limits]
//! max_snapshot_bytes = 524288000
//! ```

use heapscope_core::{HeapscopeError, MAX_SNAPSHOT_PAYLOAD_SIZE, SortColumn, SortDirection, SortSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "HEAPSCOPE_CONFIG";

/// Maximum size of a config file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// FILE CONFIG
// =============================================================================

/// Top-level config file structure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// `[view]` section
    #[serde(default)]
    pub view: ViewConfig,

    /// `[limits]` section
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Defaults for how a tree is built and printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_sort")]
    pub sort: SortColumn,

    #[serde(default)]
    pub ascending: bool,

    /// Number of levels printed below the root. Unlimited when absent.
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Count references while building.
    #[serde(default)]
    pub references: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            sort: default_sort(),
            ascending: false,
            max_depth: None,
            references: false,
        }
    }
}

fn default_sort() -> SortColumn {
    SortColumn::Size
}

/// Input limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_snapshot_bytes")]
    pub max_snapshot_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_snapshot_bytes: default_max_snapshot_bytes(),
        }
    }
}

fn default_max_snapshot_bytes() -> u64 {
    MAX_SNAPSHOT_PAYLOAD_SIZE as u64
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Parse a config document.
    pub fn from_toml_str(content: &str) -> Result<Self, HeapscopeError> {
        toml::from_str(content).map_err(|e| HeapscopeError::ConfigError(e.to_string()))
    }

    /// Load the config named by `--config`, else by `HEAPSCOPE_CONFIG`.
    ///
    /// With neither set the defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self, HeapscopeError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit, from_env.as_deref())
    }

    /// Same as [`Config::load`] with the environment value passed in.
    ///
    /// A named file that does not exist is an error.
    pub fn load_from(explicit: Option<&Path>, from_env: Option<&Path>) -> Result<Self, HeapscopeError> {
        let Some(path) = explicit.or(from_env) else {
            return Ok(Self::default());
        };

        let metadata = std::fs::metadata(path).map_err(|e| {
            HeapscopeError::ConfigError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(HeapscopeError::ConfigError(format!(
                "Config file {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            HeapscopeError::ConfigError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Sort order configured in `[view]`.
    #[must_use]
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec::new(self.view.sort, SortDirection::from_ascending(self.view.ascending))
    }
}

// =============================================================================
// TESTS
// =============================================================================
