//! Global configuration model for the layer store and the bundler.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LayercopyError, Result};
use crate::types::Ownership;

/// Root configuration shared by the layer store and the bundler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayercopyConfig {
    /// Base directory holding the `volumes/` and `diffs/` subtrees.
    pub base_dir: PathBuf,
    /// Identity written onto every bundle entry.
    pub owner: Ownership,
}

impl Default for LayercopyConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(crate::constants::DEFAULT_BASE_DIR),
            owner: Ownership::sentinel(),
        }
    }
}

impl LayercopyConfig {
    /// Creates a configuration rooted at `base_dir` with the sentinel owner.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file. Absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON, or if
    /// the base directory is empty.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LayercopyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can be used to derive storage paths.
    ///
    /// # Errors
    ///
    /// Returns `LayercopyError::Config` if the base directory is empty.
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(LayercopyError::Config {
                message: "base_dir must not be empty".into(),
            });
        }
        Ok(())
    }
}
